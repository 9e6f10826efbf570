use crate::models::health::{HealthResponse, RegisteredModules};
use chrono::Utc;
use rocket::{State, get};
use rocket::serde::json::Json;
use rocket_okapi::openapi;

/// Liveness probe listing the mounted API modules
#[openapi(tag = "Health")]
#[get("/")]
pub async fn healthcheck(modules: &State<RegisteredModules>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        timestamp: Utc::now(),
        modules: modules.0.clone(),
    })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![healthcheck]
}
