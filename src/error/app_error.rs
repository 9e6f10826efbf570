use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::Config;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Internal server error")]
    Identity {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Internal server error")]
    Internal(String),
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    UuidError {
        message: String,
        #[source]
        source: uuid::Error,
    },
    #[error("{0}")]
    CreateUser(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    TokenRefresh(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// A business rule was violated (e.g. an empty booking interval or removing the last owner).
    #[error("{0}")]
    Invariant(String),
    #[error("Validation failed")]
    ValidationError(#[from] ValidationErrors),
}

/// JSON body of every failed request.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            errors: None,
            detail: None,
        }
    }
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn identity(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Identity {
            message: message.into(),
            source,
        }
    }

    pub fn uuid(message: impl Into<String>, source: uuid::Error) -> Self {
        Self::UuidError {
            message: message.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Db { .. } | AppError::Identity { .. } | AppError::Internal(_) | AppError::ConfigurationError { .. } => "internal_error",
            AppError::BadRequest(_) | AppError::UuidError { .. } => "bad_request",
            AppError::CreateUser(_) => "create_user_failed",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidCredentials(_) => "invalid_credentials",
            AppError::TokenRefresh(_) => "token_refresh_failed",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Invariant(_) | AppError::ValidationError(_) => "validation_error",
        }
    }

    /// Internal diagnostics, only ever rendered when error details are exposed.
    fn detail(&self) -> String {
        match self {
            AppError::Db { message, source } => format!("{}: {}", message, source),
            AppError::Identity { message, source } => format!("{}: {}", message, source),
            AppError::ConfigurationError { message, source } => format!("{}: {}", message, source),
            AppError::UuidError { message, source } => format!("{}: {}", message, source),
            AppError::Internal(message) => message.clone(),
            other => format!("{:?}", other),
        }
    }

    pub fn to_response(&self, expose_details: bool) -> ErrorResponse {
        let mut response = ErrorResponse::new(self.code(), self.to_string());
        if let AppError::ValidationError(errors) = self {
            response.errors = Some(validation_messages(errors));
        }
        if expose_details {
            response.detail = Some(self.detail());
        }
        response
    }
}

fn validation_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                .collect();
            (to_camel_case(&field), messages)
        })
        .collect()
}

// Request structs are camelCase on the wire, validator reports Rust field names.
fn to_camel_case(field: &str) -> String {
    if field.starts_with('_') {
        return field.to_string();
    }

    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn expose_details(req: &Request<'_>) -> bool {
    req.rocket().state::<Config>().is_some_and(|config| config.api.expose_error_details)
}

/// Keeps the envelope of a failed request guard or data guard so the catcher for
/// its status can render it instead of a generic message.
pub(crate) fn stash_guard_error(req: &Request<'_>, error: &AppError) {
    let response = error.to_response(expose_details(req));
    req.local_cache(|| Some(response));
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Identity { .. } => Status::InternalServerError,
            AppError::Internal(_) => Status::InternalServerError,
            AppError::ConfigurationError { .. } => Status::InternalServerError,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::UuidError { .. } => Status::BadRequest,
            AppError::CreateUser(_) => Status::BadRequest,
            AppError::Unauthorized(_) => Status::Unauthorized,
            AppError::InvalidCredentials(_) => Status::Unauthorized,
            AppError::TokenRefresh(_) => Status::Unauthorized,
            AppError::Forbidden(_) => Status::Forbidden,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::Invariant(_) => Status::UnprocessableEntity,
            AppError::ValidationError(_) => Status::UnprocessableEntity,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let user_id = req
            .local_cache(|| None::<crate::auth::CurrentUser>)
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        let status = Status::from(&self);
        if status.class().is_server_error() {
            error!(
                error = ?self,
                request_id = %request_id,
                user_id = %user_id,
                method = %method,
                uri = %uri,
                "request failed"
            );
        } else {
            warn!(
                error = %self,
                code = self.code(),
                request_id = %request_id,
                user_id = %user_id,
                method = %method,
                uri = %uri,
                "request rejected"
            );
        }

        let body = self.to_response(expose_details(req));
        Response::build_from(Json(body).respond_to(req)?).status(status).ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (status, description) in [
            ("400", "Bad Request"),
            ("401", "Unauthorized"),
            ("403", "Forbidden"),
            ("404", "Not Found"),
            ("409", "Conflict"),
            ("422", "Validation Error"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                status.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(e: uuid::Error) -> Self {
        AppError::uuid("Invalid identifier", e)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::identity("Identity provider request failed", e)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict("Resource already exists".to_string()),
            sqlx::Error::Database(ref db) if db.is_check_violation() => AppError::Invariant("Constraint violated".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}
