//! Client for the hosted identity provider (a GoTrue-compatible auth API).
//!
//! The gateway never stores credentials. Register, login, refresh, token
//! verification and sign-out are forwarded to the provider and its answers are
//! mapped onto [`User`], [`Session`] and [`AppError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::error::app_error::AppError;
use crate::models::session::{AuthSession, Session};
use crate::models::user::User;

pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates the account. When the provider withholds a session (email
    /// confirmation flow) the implementation signs in right away.
    async fn sign_up(&self, username: &str, password: &str) -> Result<AuthSession, AppError>;
    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, AppError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
    async fn verify(&self, access_token: &str) -> Result<User, AppError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError>;
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
}

impl From<GoTrueUser> for User {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            username: user.email.unwrap_or_default(),
            created_at: user.created_at,
            email_confirmed: user.email_confirmed_at.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    user: GoTrueUser,
}

impl From<GoTrueSession> for AuthSession {
    fn from(session: GoTrueSession) -> Self {
        Self {
            user: session.user.into(),
            session: Session {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
            },
        }
    }
}

// Sign-up answers with a full session when auto-confirm is on, otherwise with the bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

/// Failure reported by the provider: its status and best-effort message.
#[derive(Debug)]
struct ProviderRejection {
    status: StatusCode,
    message: String,
}

fn provider_message(body: &[u8]) -> String {
    let parsed: GoTrueErrorBody = serde_json::from_slice(body).unwrap_or_default();
    parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .unwrap_or_else(|| "unknown provider error".to_string())
}

fn sign_up_error(rejection: ProviderRejection) -> AppError {
    if rejection.status.is_server_error() {
        return AppError::Internal(format!("Identity provider failed during sign-up: {}", rejection.message));
    }
    AppError::CreateUser(format!("Failed to create user: {}", rejection.message))
}

fn sign_in_error(rejection: ProviderRejection) -> AppError {
    match rejection.status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::InvalidCredentials(format!("Failed to login user: {}", rejection.message))
        }
        _ => AppError::Internal(format!("Identity provider failed during login: {}", rejection.message)),
    }
}

fn verify_error(rejection: ProviderRejection) -> AppError {
    if rejection.status.is_client_error() {
        return AppError::InvalidCredentials("Invalid token".to_string());
    }
    AppError::Internal(format!("Failed to verify token: {}", rejection.message))
}

fn refresh_error(rejection: ProviderRejection) -> AppError {
    if rejection.status.is_server_error() {
        return AppError::Internal(format!("Identity provider failed during refresh: {}", rejection.message));
    }
    AppError::TokenRefresh(format!("Failed to refresh token: {}", rejection.message))
}

fn sign_out_error(rejection: ProviderRejection) -> AppError {
    AppError::Internal(format!("Failed to sign out user: {}", rejection.message))
}

pub struct GoTrueIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoTrueIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_seconds)).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.endpoint(path)).header("apikey", &self.api_key)
    }

    /// Sends the request and decodes a success body; a non-success status comes back
    /// as `Ok(Err(rejection))` so each call can map it to its own error kind.
    async fn exchange<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Result<T, ProviderRejection>, AppError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(Ok(response.json::<T>().await?));
        }

        let body = response.bytes().await?;
        let message = provider_message(&body);
        warn!(status = %status, message = %message, "identity provider rejected request");
        Ok(Err(ProviderRejection { status, message }))
    }

    async fn password_grant(&self, username: &str, password: &str) -> Result<Result<GoTrueSession, ProviderRejection>, AppError> {
        let request = self
            .post("/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": username, "password": password }));
        self.exchange(request).await
    }
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn sign_up(&self, username: &str, password: &str) -> Result<AuthSession, AppError> {
        let request = self.post("/signup").json(&json!({ "email": username, "password": password }));
        match self.exchange::<SignUpResponse>(request).await?.map_err(sign_up_error)? {
            SignUpResponse::Session(session) => Ok(session.into()),
            SignUpResponse::User(user) => {
                debug!(user_id = %user.id, "sign-up returned no session, signing in");
                let session = self
                    .password_grant(username, password)
                    .await?
                    .map_err(|rejection| AppError::CreateUser(format!("User created but failed to create session: {}", rejection.message)))?;
                Ok(session.into())
            }
        }
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, AppError> {
        let session = self.password_grant(username, password).await?.map_err(sign_in_error)?;
        Ok(session.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self.post("/logout").bearer_auth(access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await?;
        Err(sign_out_error(ProviderRejection {
            status,
            message: provider_message(&body),
        }))
    }

    async fn verify(&self, access_token: &str) -> Result<User, AppError> {
        let request = self.client.get(self.endpoint("/user")).header("apikey", &self.api_key).bearer_auth(access_token);
        let user = self.exchange::<GoTrueUser>(request).await?.map_err(verify_error)?;
        Ok(user.into())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        let request = self
            .post("/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        let session = self.exchange::<GoTrueSession>(request).await?.map_err(refresh_error)?;
        Ok(session.into())
    }
}
