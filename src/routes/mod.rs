pub mod auth;
pub mod booking;
pub mod error;
pub mod health;
pub mod organization;
pub mod workspace;

use crate::error::app_error::AppError;
use uuid::Uuid;

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::uuid(format!("Invalid {}", what), e))
}
