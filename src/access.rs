//! Capability-based access checks for views and admin operations.
//!
//! DESIGN
//! ======
//! Each navigable view (and the admin notification stream) is a `Resource`
//! with a single `Requirement`. Navigation asks [`decide`] once per request
//! with the explicit session; there is no string role comparison at call
//! sites.

use std::fmt;

use crate::auth::{AuthSession, Role};
use crate::error::ClientError;

/// Something a session may or may not be allowed to reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Landing,
    Register,
    VerifyOtp,
    Login,
    AdminLogin,
    SignAgreement,
    Dashboard,
    WorkEditor,
    Profile,
    ViewAgreement,
    AdminDashboard,
    UserManagement,
    AgreementManagement,
    SignedAgreements,
    PdfManagement,
    SiteConfig,
    AdminWorkEditor,
    Notifications,
}

/// Who may reach a [`Resource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Role(Role),
}

impl Resource {
    /// Canonical path for the resource. Parameterised routes use `:param`.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Register => "/register",
            Self::VerifyOtp => "/verify-otp",
            Self::Login => "/login",
            Self::AdminLogin => "/admin-login",
            Self::SignAgreement => "/sign-agreement/:token",
            Self::Dashboard => "/dashboard",
            Self::WorkEditor => "/work-editor",
            Self::Profile => "/profile",
            Self::ViewAgreement => "/view-agreement",
            Self::AdminDashboard => "/admin-dashboard",
            Self::UserManagement => "/admin/users",
            Self::AgreementManagement => "/admin/agreements",
            Self::SignedAgreements => "/admin/signed-agreements",
            Self::PdfManagement => "/admin/pdfs",
            Self::SiteConfig => "/admin/site-config",
            Self::AdminWorkEditor => "/admin/users/:id/work",
            Self::Notifications => "/admin/notifications",
        }
    }

    #[must_use]
    pub fn requirement(self) -> Requirement {
        match self {
            Self::Landing
            | Self::Register
            | Self::VerifyOtp
            | Self::Login
            | Self::AdminLogin
            | Self::SignAgreement => Requirement::Public,
            Self::Dashboard | Self::WorkEditor | Self::Profile | Self::ViewAgreement => Requirement::Role(Role::User),
            Self::AdminDashboard
            | Self::UserManagement
            | Self::AgreementManagement
            | Self::SignedAgreements
            | Self::PdfManagement
            | Self::SiteConfig
            | Self::AdminWorkEditor
            | Self::Notifications => Requirement::Role(Role::Admin),
        }
    }

    /// Match a concrete path (query string ignored) to a resource.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let resource = match segments.as_slice() {
            [] | ["home"] => Self::Landing,
            ["register"] => Self::Register,
            ["verify-otp"] => Self::VerifyOtp,
            ["login"] => Self::Login,
            ["admin-login"] => Self::AdminLogin,
            ["sign-agreement", _token] => Self::SignAgreement,
            ["dashboard"] => Self::Dashboard,
            ["work-editor"] => Self::WorkEditor,
            ["profile"] => Self::Profile,
            ["view-agreement"] => Self::ViewAgreement,
            ["admin-dashboard"] => Self::AdminDashboard,
            ["admin", "users"] => Self::UserManagement,
            ["admin", "agreements"] => Self::AgreementManagement,
            ["admin", "signed-agreements"] => Self::SignedAgreements,
            ["admin", "pdfs"] => Self::PdfManagement,
            ["admin", "site-config"] => Self::SiteConfig,
            ["admin", "users", _id, "work"] => Self::AdminWorkEditor,
            ["admin", "notifications"] => Self::Notifications,
            _ => return None,
        };
        Some(resource)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// `true` when `session` satisfies the resource's requirement.
#[must_use]
pub fn can(session: Option<&AuthSession>, resource: Resource) -> bool {
    match resource.requirement() {
        Requirement::Public => true,
        Requirement::Role(role) => session.is_some_and(|s| s.role() == role),
    }
}

/// Outcome of a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Allow(Resource),
    /// No session for a protected view, or an unknown path.
    RedirectLogin,
    /// Authenticated, but the role does not match.
    RedirectHome,
}

/// Decide what navigating to `path` does for `session`.
#[must_use]
pub fn decide(session: Option<&AuthSession>, path: &str) -> RouteDecision {
    let Some(resource) = Resource::from_path(path) else {
        return RouteDecision::RedirectLogin;
    };
    match (resource.requirement(), session) {
        (Requirement::Public, _) => RouteDecision::Allow(resource),
        (Requirement::Role(_), None) => RouteDecision::RedirectLogin,
        (Requirement::Role(_), Some(s)) if can(Some(s), resource) => RouteDecision::Allow(resource),
        (Requirement::Role(_), Some(_)) => RouteDecision::RedirectHome,
    }
}

/// Where a freshly logged-in session lands.
#[must_use]
pub fn home_for(role: Role) -> Resource {
    match role {
        Role::User => Resource::Dashboard,
        Role::Admin => Resource::AdminDashboard,
    }
}

/// Require access to `resource`, returning the session on success.
///
/// # Errors
///
/// [`ClientError::NotAuthenticated`] without a session for a protected
/// resource, [`ClientError::Forbidden`] on role mismatch.
pub fn require(session: Option<&AuthSession>, resource: Resource) -> Result<Option<&AuthSession>, ClientError> {
    match resource.requirement() {
        Requirement::Public => Ok(session),
        Requirement::Role(_) => {
            let session = session.ok_or(ClientError::NotAuthenticated)?;
            if can(Some(session), resource) {
                Ok(Some(session))
            } else {
                Err(ClientError::Forbidden { role: session.role(), resource })
            }
        }
    }
}

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;
