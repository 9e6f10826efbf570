use rocket::serde::Serialize;
use schemars::JsonSchema;

use crate::models::user::{User, UserResponse};

/// Tokens issued by the identity provider. A refresh supersedes the whole pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of register, login and refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
    pub session: SessionResponse,
}

impl From<&AuthSession> for AuthResponse {
    fn from(auth: &AuthSession) -> Self {
        Self {
            success: true,
            user: UserResponse::from(&auth.user),
            session: SessionResponse::from(&auth.session),
        }
    }
}
