use chrono::{DateTime, Utc};
use rocket::serde::Serialize;
use schemars::JsonSchema;

#[derive(Serialize, Debug, JsonSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub modules: Vec<String>,
}

/// Names of the API modules mounted at ignition, reported by the health check.
#[derive(Debug, Clone, Default)]
pub struct RegisteredModules(pub Vec<String>);
