//! `/api/auth` endpoints: registration, OTP, login, agreement signing.

use reqwest::Method;
use tracing::info;

use super::types::{
    Ack, Agreement, AgreementResponse, Credentials, RegisterRequest, SignAgreementRequest, SignedAgreement,
    VerifyOtpRequest, ViewAgreementResponse,
};
use super::{ApiClient, bearer, send_json};
use crate::access::Resource;
use crate::auth::{AuthSession, Role};
use crate::error::ClientError;

impl ApiClient {
    /// # Errors
    ///
    /// Local validation failures, or the server's rejection.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Ack, ClientError> {
        request.validate()?;
        let ack = send_json(self.request(Method::POST, "/api/auth/register")?.json(request)).await?;
        info!(email = %request.email, "registration submitted");
        Ok(ack)
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for an empty code, or the server's
    /// rejection.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Ack, ClientError> {
        if otp.trim().is_empty() {
            return Err(ClientError::Validation("Please enter the OTP".to_owned()));
        }
        let body = VerifyOtpRequest { email, otp: otp.trim() };
        send_json(self.request(Method::POST, "/api/auth/verify-otp")?.json(&body)).await
    }

    /// Log in as a regular user and return the new session.
    ///
    /// # Errors
    ///
    /// The server's rejection, or [`ClientError::Forbidden`] if the account
    /// turns out to be an admin.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        self.login_at("/api/auth/login", email, password, Role::User).await
    }

    /// Log in through the admin endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::login`].
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        self.login_at("/api/auth/admin-login", email, password, Role::Admin).await
    }

    async fn login_at(&self, path: &str, email: &str, password: &str, expected: Role) -> Result<AuthSession, ClientError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation("Email and password are required".to_owned()));
        }
        let body = Credentials { email: email.trim(), password };
        let session: AuthSession = send_json(self.request(Method::POST, path)?.json(&body)).await?;
        if session.role() != expected {
            let resource = if expected == Role::Admin { Resource::AdminLogin } else { Resource::Login };
            return Err(ClientError::Forbidden { role: session.role(), resource });
        }
        info!(user = %session.user.id, role = %session.role(), "logged in");
        Ok(session)
    }

    /// Current agreement text, fetched with the one-time signing token.
    ///
    /// # Errors
    ///
    /// The server's rejection.
    pub async fn fetch_agreement(&self, sign_token: Option<&str>) -> Result<Agreement, ClientError> {
        let mut request = self.http.get(self.url("/api/auth/agreement"));
        if let Some(token) = sign_token {
            request = bearer(request, token)?;
        }
        let response: AgreementResponse = send_json(request).await?;
        Ok(response.agreement)
    }

    /// Sign the agreement. The server answers with a fresh session.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an empty signature, or the server's
    /// rejection.
    pub async fn sign_agreement(&self, sign_token: &str, signature: &str) -> Result<AuthSession, ClientError> {
        if signature.trim().is_empty() {
            return Err(ClientError::Validation("Please provide your signature".to_owned()));
        }
        let request = self.http.post(self.url("/api/auth/sign-agreement"));
        let request = bearer(request, sign_token)?.json(&SignAgreementRequest { signature });
        let session: AuthSession = send_json(request).await?;
        info!(user = %session.user.id, "agreement signed");
        Ok(session)
    }

    /// The signed agreement of the logged-in user.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] without a user session, or the
    /// server's rejection.
    pub async fn my_agreement(&self) -> Result<SignedAgreement, ClientError> {
        let user_id = self.session().map(|s| s.user.id.clone()).ok_or(ClientError::NotAuthenticated)?;
        let path = format!("/api/auth/get-agreement/{user_id}");
        let response: ViewAgreementResponse = send_json(self.authorized(Method::GET, &path, Resource::ViewAgreement)?).await?;
        Ok(response.agreement)
    }
}
