//! Wire types for the platform REST API.
//!
//! Field names follow the server's camelCase JSON. Record ids arrive as
//! `_id` (or `id` from the auth endpoints). Timestamps are RFC 3339 and are
//! optional everywhere: older records omit them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::auth::Role;
use crate::error::ClientError;
use crate::session::{StatusSnapshot, WorkSession, WorkStatus};

// =============================================================================
// USERS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub alternative_mobile_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_signed_agreement: bool,
    #[serde(default)]
    pub is_penalized: bool,
    #[serde(default)]
    pub penalized_reason: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub penalized_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub work_started_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub work_submitted: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl AccountUser {
    /// Admin table badge.
    #[must_use]
    pub fn status_badge(&self) -> &'static str {
        if self.is_penalized {
            "Penalized"
        } else if self.work_submitted {
            "Submitted"
        } else if self.work_started_at.is_some() {
            "Working"
        } else if self.is_signed_agreement {
            "Signed"
        } else if self.is_verified {
            "Verified"
        } else {
            "Pending"
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<AccountUser>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserResponse {
    pub user: AccountUser,
}

/// Account creation by an administrator.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_mobile_number: Option<String>,
    pub password: String,
    pub role: Role,
}

/// Partial user update. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_mobile_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.mobile_number.is_none()
            && self.alternative_mobile_number.is_none()
            && self.role.is_none()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PasswordResponse {
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PenalizeRequest<'a> {
    pub reason: &'a str,
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_mobile_number: Option<String>,
    pub password: String,
}

impl RegisterRequest {
    /// Check required fields before any request is made.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ClientError> {
        require_text(&self.name, "Name is required")?;
        if !self.email.contains('@') {
            return Err(ClientError::Validation("A valid email is required".to_owned()));
        }
        validate_mobile(&self.mobile_number, self.alternative_mobile_number.as_deref())?;
        if self.password.len() < 6 {
            return Err(ClientError::Validation("Password must be at least 6 characters".to_owned()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignAgreementRequest<'a> {
    pub signature: &'a str,
}

/// Generic `{ message }` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    #[must_use]
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

// =============================================================================
// WORK
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub project_link: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_saved: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_submitted: bool,
}

/// `GET /api/users/dashboard`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub work_status: WorkStatus,
    /// Milliseconds until the deadline, computed by the server.
    #[serde(default)]
    pub time_remaining: Option<i64>,
    #[serde(default)]
    pub days_left: Option<i64>,
    pub user: AccountUser,
    #[serde(default)]
    pub work: Option<WorkRecord>,
}

impl DashboardResponse {
    /// Rebuild the session fields the server reported.
    #[must_use]
    pub fn to_session(&self) -> WorkSession {
        let work = self.work.as_ref();
        let started_at = self.user.work_started_at.or_else(|| work.and_then(|w| w.started_at));
        WorkSession::new()
            .with_started_at(started_at)
            .with_submitted_at(work.and_then(|w| w.submitted_at))
            .with_penalty(self.user.is_penalized, self.user.penalized_reason.clone())
            .with_content(work.map(|w| w.content.clone()).unwrap_or_default())
            .with_last_saved(work.and_then(|w| w.last_saved))
    }

    /// Status as reported by the server, refined with the penalty flag.
    #[must_use]
    pub fn snapshot(&self, now: OffsetDateTime) -> StatusSnapshot {
        StatusSnapshot::from_remote(self.work_status, self.time_remaining, &self.to_session(), now)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DraftResponse {
    #[serde(default)]
    pub work: Option<WorkRecord>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkRequest {
    pub project_link: String,
    pub password: String,
}

impl StartWorkRequest {
    /// # Errors
    ///
    /// [`ClientError::Validation`] when either field is blank.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.project_link.trim().is_empty() || self.password.trim().is_empty() {
            return Err(ClientError::Validation("Please fill in both project link and password".to_owned()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ContentBody<'a> {
    pub content: &'a str,
}

/// `POST /api/work/save-draft`: `{ work: { lastSaved } }`, or a bare
/// `{ lastSaved }` from older servers.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftResponse {
    #[serde(default)]
    pub work: Option<WorkRecord>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_saved: Option<OffsetDateTime>,
}

impl SaveDraftResponse {
    /// # Errors
    ///
    /// [`ClientError::MissingField`] when neither shape carries `lastSaved`.
    pub fn last_saved(&self) -> Result<OffsetDateTime, ClientError> {
        self.work
            .as_ref()
            .and_then(|w| w.last_saved)
            .or(self.last_saved)
            .ok_or(ClientError::MissingField("lastSaved"))
    }
}

// =============================================================================
// AGREEMENTS
// =============================================================================

/// A reference that the server may or may not have populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Populated<T> {
    Record(T),
    Id(String),
}

impl<T> Populated<T> {
    #[must_use]
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Record(record) => Some(record),
            Self::Id(_) => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AgreementResponse {
    pub agreement: Agreement,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AgreementsResponse {
    #[serde(default)]
    pub agreements: Vec<Agreement>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementRef {
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAgreement {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<Populated<UserRef>>,
    #[serde(default)]
    pub agreement_id: Option<Populated<AgreementRef>>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_mobile_number: Option<String>,
    #[serde(default, alias = "content")]
    pub agreement_content: Option<String>,
    /// Signature image as a data URL.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub pdf_path: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub signed_at: Option<OffsetDateTime>,
}

impl SignedAgreement {
    /// Signer name from the flat field or the populated user.
    #[must_use]
    pub fn signer_name(&self) -> Option<&str> {
        self.user_name
            .as_deref()
            .or_else(|| self.user_id.as_ref().and_then(Populated::record).map(|u| u.name.as_str()))
    }

    #[must_use]
    pub fn signer_email(&self) -> Option<&str> {
        self.user_email
            .as_deref()
            .or_else(|| self.user_id.as_ref().and_then(Populated::record).map(|u| u.email.as_str()))
    }

    #[must_use]
    pub fn version(&self) -> Option<u32> {
        self.agreement_id.as_ref().and_then(Populated::record).and_then(|a| a.version)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAgreementsResponse {
    #[serde(default)]
    pub signed_agreements: Vec<SignedAgreement>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAgreementResponse {
    pub signed_agreement: SignedAgreement,
}

/// `GET /api/auth/get-agreement/{userId}`.
#[derive(Clone, Debug, Deserialize)]
pub struct ViewAgreementResponse {
    pub agreement: SignedAgreement,
}

// =============================================================================
// PDFS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pdf {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub uploaded_at: Option<OffsetDateTime>,
}

impl Pdf {
    /// Name to save a download under.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.original_name.clone().unwrap_or_else(|| format!("{}.pdf", self.title))
    }

    /// Size in megabytes with two decimals.
    #[must_use]
    pub fn size_label(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let mb = self.file_size as f64 / 1024.0 / 1024.0;
        format!("{mb:.2} MB")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PdfsResponse {
    #[serde(default)]
    pub pdfs: Vec<Pdf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePdfRequest {
    pub is_active: bool,
}

// =============================================================================
// ADMIN
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub verified_users: u64,
    #[serde(default)]
    pub signed_users: u64,
    #[serde(default)]
    pub submitted_users: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatsResponse {
    pub stats: DashboardStats,
}

/// One row of `GET /api/admin/detailed-user-data`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedUser {
    #[serde(flatten)]
    pub user: AccountUser,
    #[serde(default)]
    pub work: Option<WorkRecord>,
}

/// Accepts both a bare array and `{ users: [...] }`.
///
/// # Errors
///
/// [`ClientError::Json`] when neither shape matches.
pub fn parse_detailed_users(body: Value) -> Result<Vec<DetailedUser>, ClientError> {
    let rows = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => map.remove("users").unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    Ok(serde_json::from_value(rows)?)
}

/// `GET /api/admin/users/{id}/work` and `.../work-edit`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AdminWorkResponse {
    #[serde(default)]
    pub user: Option<AccountUser>,
    #[serde(default)]
    pub work: Option<WorkRecord>,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Profile fields a user may change.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub mobile_number: String,
    pub alternative_mobile_number: String,
}

impl ProfileUpdate {
    /// # Errors
    ///
    /// [`ClientError::Validation`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ClientError> {
        require_text(&self.name, "Name is required")?;
        let alternative = Some(self.alternative_mobile_number.as_str()).filter(|s| !s.is_empty());
        validate_mobile(&self.mobile_number, alternative)
    }
}

fn require_text(value: &str, message: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(message.to_owned()));
    }
    Ok(())
}

fn validate_mobile(mobile: &str, alternative: Option<&str>) -> Result<(), ClientError> {
    require_text(mobile, "Mobile number is required")?;
    if !is_mobile_number(mobile) {
        return Err(ClientError::Validation("Mobile number must be 10 digits".to_owned()));
    }
    if alternative.is_some_and(|alt| !is_mobile_number(alt)) {
        return Err(ClientError::Validation("Alternative mobile number must be 10 digits".to_owned()));
    }
    Ok(())
}

#[must_use]
pub fn is_mobile_number(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
