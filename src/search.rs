//! Admin universal search: typed results and a debounced query box.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::time::Instant;

use crate::api::types::{AccountUser, Pdf, Populated, SignedAgreement, UserRef};
use crate::debounce::Debounce;
use crate::editor::Document;

/// Queries shorter than this are not sent.
pub const MIN_QUERY_LEN: usize = 2;

const WORK_PREVIEW_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SearchScope {
    #[default]
    All,
    Users,
    Agreements,
    Pdfs,
    Work,
}

impl SearchScope {
    /// Value of the `type` query parameter.
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Users => "users",
            Self::Agreements => "agreements",
            Self::Pdfs => "pdfs",
            Self::Work => "work",
        }
    }

    fn includes(self, kind: ResultKind) -> bool {
        match self {
            Self::All => true,
            Self::Users => kind == ResultKind::User,
            Self::Agreements => kind == ResultKind::Agreement,
            Self::Pdfs => kind == ResultKind::Pdf,
            Self::Work => kind == ResultKind::Work,
        }
    }
}

/// A work document matched by search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkHit {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<Populated<UserRef>>,
    #[serde(default)]
    pub content: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
}

impl WorkHit {
    #[must_use]
    pub fn author(&self) -> Option<&UserRef> {
        self.user_id.as_ref().and_then(Populated::record)
    }

    #[must_use]
    pub fn preview(&self) -> String {
        Document::new(self.content.as_str()).preview(WORK_PREVIEW_CHARS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultKind {
    User,
    Agreement,
    Pdf,
    Work,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchResult {
    User(AccountUser),
    Agreement(SignedAgreement),
    Pdf(Pdf),
    Work(WorkHit),
}

impl SearchResult {
    #[must_use]
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::User(_) => ResultKind::User,
            Self::Agreement(_) => ResultKind::Agreement,
            Self::Pdf(_) => ResultKind::Pdf,
            Self::Work(_) => ResultKind::Work,
        }
    }

    /// Identifier used to open the result.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::User(user) => &user.id,
            Self::Agreement(agreement) => &agreement.id,
            Self::Pdf(pdf) => &pdf.id,
            Self::Work(work) => &work.id,
        }
    }

    /// Primary line of a result row.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::User(user) => user.name.clone(),
            Self::Agreement(agreement) => agreement.signer_name().unwrap_or("Unknown signer").to_owned(),
            Self::Pdf(pdf) => pdf.title.clone(),
            Self::Work(work) => work.author().map_or_else(|| "Unknown user".to_owned(), |u| u.name.clone()),
        }
    }

    /// Secondary line of a result row.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::User(user) => format!("{} ({})", user.email, user.status_badge()),
            Self::Agreement(agreement) => {
                let email = agreement.signer_email().unwrap_or_default();
                match agreement.signed_at {
                    Some(at) => format!("{email}, signed {}", at.date()),
                    None => email.to_owned(),
                }
            }
            Self::Pdf(pdf) => {
                let state = if pdf.is_active { "Active" } else { "Inactive" };
                format!("{} ({state})", pdf.file_name())
            }
            Self::Work(work) => match work.submitted_at {
                Some(at) => format!("Submitted {}: {}", at.date(), work.preview()),
                None => format!("Draft: {}", work.preview()),
            },
        }
    }
}

/// `results` object of `GET /api/admin/universal-search`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub users: Vec<AccountUser>,
    #[serde(default)]
    pub signed_agreements: Vec<SignedAgreement>,
    #[serde(default)]
    pub pdfs: Vec<Pdf>,
    #[serde(default)]
    pub works: Vec<WorkHit>,
}

impl SearchResults {
    #[must_use]
    pub fn total(&self) -> usize {
        self.users.len() + self.signed_agreements.len() + self.pdfs.len() + self.works.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Flatten into typed rows (users, agreements, PDFs, work) limited to
    /// `scope`.
    #[must_use]
    pub fn into_results(self, scope: SearchScope) -> Vec<SearchResult> {
        self.users
            .into_iter()
            .map(SearchResult::User)
            .chain(self.signed_agreements.into_iter().map(SearchResult::Agreement))
            .chain(self.pdfs.into_iter().map(SearchResult::Pdf))
            .chain(self.works.into_iter().map(SearchResult::Work))
            .filter(|result| scope.includes(result.kind()))
            .collect()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UniversalSearchResponse {
    #[serde(default)]
    pub results: SearchResults,
}

/// Trimmed query, or `None` when too short to send.
#[must_use]
pub fn normalize_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (trimmed.chars().count() >= MIN_QUERY_LEN).then(|| trimmed.to_owned())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub scope: SearchScope,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchAction {
    /// Nothing to do yet.
    Idle,
    /// Query became too short: drop shown results.
    Clear,
    Issue(SearchRequest),
}

/// Search input state. Each keystroke re-arms the debounce; the request
/// goes out once typing pauses.
#[derive(Clone, Debug)]
pub struct SearchBox {
    query: String,
    scope: SearchScope,
    debounce: Debounce,
    last_issued: Option<SearchRequest>,
}

impl SearchBox {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { query: String::new(), scope: SearchScope::All, debounce: Debounce::new(delay), last_issued: None }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    /// Deadline for the pending request, for `sleep_until`.
    #[must_use]
    pub fn due(&self) -> Option<Instant> {
        self.debounce.due()
    }

    pub fn set_query(&mut self, raw: impl Into<String>, now: Instant) -> SearchAction {
        self.query = raw.into();
        if normalize_query(&self.query).is_none() {
            self.debounce.clear();
            self.last_issued = None;
            return SearchAction::Clear;
        }
        self.debounce.touch_at(now);
        SearchAction::Idle
    }

    /// Switch tabs. A valid query is searched again after the delay.
    pub fn set_scope(&mut self, scope: SearchScope, now: Instant) {
        self.scope = scope;
        if normalize_query(&self.query).is_some() {
            self.debounce.touch_at(now);
        }
    }

    /// Call when the timer fires (or on any tick).
    pub fn poll(&mut self, now: Instant) -> SearchAction {
        if !self.debounce.take_if_due(now) {
            return SearchAction::Idle;
        }
        let Some(query) = normalize_query(&self.query) else {
            return SearchAction::Idle;
        };
        let request = SearchRequest { query, scope: self.scope };
        if self.last_issued.as_ref() == Some(&request) {
            return SearchAction::Idle;
        }
        self.last_issued = Some(request.clone());
        SearchAction::Issue(request)
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
