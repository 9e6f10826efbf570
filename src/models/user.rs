use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// An account known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub email_confirmed: bool,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub email_confirmed: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
            email_confirmed: user.email_confirmed,
        }
    }
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct CredentialsRequest {
    #[validate(email(message = "Invalid email address"))]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    #[validate(custom(function = "crate::models::user::validate_password_strength"))]
    pub password: String,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct TokenRequest {
    #[validate(length(min = 6, message = "Token is too short"))]
    pub token: String,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: UserResponse,
}

pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password").with_message("Password must contain at least one letter and one number".into()))
    }
}
