use tracing::info;

use crate::error::app_error::AppError;
use crate::identity::IdentityProvider;
use crate::models::session::AuthSession;
use crate::models::user::{CredentialsRequest, User};

/// Delegates account and session handling to the identity provider.
pub struct AuthService<'a> {
    identity: &'a dyn IdentityProvider,
}

impl<'a> AuthService<'a> {
    pub fn new(identity: &'a dyn IdentityProvider) -> Self {
        AuthService { identity }
    }

    pub async fn register(&self, request: &CredentialsRequest) -> Result<AuthSession, AppError> {
        let auth = self.identity.sign_up(&request.username, &request.password).await?;
        info!(user_id = %auth.user.id, "user registered");
        Ok(auth)
    }

    pub async fn login(&self, request: &CredentialsRequest) -> Result<AuthSession, AppError> {
        let auth = self.identity.sign_in(&request.username, &request.password).await?;
        info!(user_id = %auth.user.id, "user logged in");
        Ok(auth)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        let auth = self.identity.refresh(refresh_token).await?;
        info!(user_id = %auth.user.id, "session refreshed");
        Ok(auth)
    }

    pub async fn verify(&self, access_token: &str) -> Result<User, AppError> {
        self.identity.verify(access_token).await
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.identity.sign_out(access_token).await?;
        info!("user signed out");
        Ok(())
    }
}
