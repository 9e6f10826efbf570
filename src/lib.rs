mod auth;
mod config;
mod database;
mod db;
mod error;
mod identity;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use error::app_error::AppError;

use crate::db::stage_db;
use crate::identity::{GoTrueIdentityProvider, SharedIdentityProvider};
use crate::middleware::RequestLogger;
use crate::models::health::RegisteredModules;
use crate::routes as app_routes;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, Cors, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=info,booking_gateway::service=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A global subscriber may already be installed by an embedding process.
    let _ = if json_format { subscriber.json().try_init() } else { subscriber.try_init() };
}

fn build_cors(cors_config: &config::CorsConfig) -> Result<Cors, AppError> {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        return Err(AppError::Internal(
            "Invalid CORS configuration: wildcard origins (*) cannot be combined with credentials".to_string(),
        ));
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    let options = CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Delete, Method::Patch, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Authorization", "Accept", middleware::REQUEST_ID_HEADER]),
        expose_headers: [middleware::REQUEST_ID_HEADER.to_string()].into_iter().collect(),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    };

    options
        .to_cors()
        .map_err(|e| AppError::Internal(format!("Failed to create CORS fairing: {}", e)))
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

/// A self-contained group of routes mounted under the base path.
struct ApiModule {
    name: &'static str,
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

impl ApiModule {
    fn new(name: &'static str, path: &'static str, (routes, openapi): (Vec<rocket::Route>, rocket_okapi::okapi::openapi3::OpenApi)) -> Self {
        Self { name, path, routes, openapi }
    }
}

fn api_modules() -> Vec<ApiModule> {
    vec![
        ApiModule::new("auth", "/auth", app_routes::auth::routes()),
        ApiModule::new("bookings", "/bookings", app_routes::booking::routes()),
        ApiModule::new("organizations", "/organizations", app_routes::organization::routes()),
        ApiModule::new("workspaces", "/workspaces", app_routes::workspace::routes()),
        ApiModule::new("health", "/health", app_routes::health::routes()),
    ]
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Result<Rocket<Build>, AppError> {
    let modules = api_modules();
    let registered = RegisteredModules(modules.iter().map(|module| module.name.to_string()).collect());

    let mut openapi_list = Vec::new();
    for module in modules {
        tracing::debug!(module = module.name, path = module.path, routes = module.routes.len(), "mounting module");
        rocket = rocket.mount(join_base_path(base_path, module.path), module.routes);
        openapi_list.push((module.path, module.openapi));
    }

    if enable_swagger {
        let openapi_docs = marge_spec_list(&openapi_list).map_err(|e| AppError::Internal(format!("Could not merge OpenAPI spec: {}", e)))?;

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let docs_path = join_base_path(base_path, "docs");
        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(
            docs_path,
            make_swagger_ui(&SwaggerUIConfig {
                url: openapi_url,
                ..Default::default()
            }),
        );
    }

    Ok(rocket.manage(registered))
}

/// Everything except the storage and identity backends.
fn base_rocket(config: &Config) -> Result<Rocket<Build>, AppError> {
    let base_path = normalize_base_path(&config.api.base_path);

    let figment = rocket::Config::figment()
        .merge(("port", config.server.port))
        .merge(("address", config.server.address.as_str()));

    let rocket = rocket::custom(figment)
        .attach(build_cors(&config.cors)?)
        .attach(RequestLogger)
        .manage(config.clone());

    let mut rocket = mount_api_routes(rocket, &base_path, config.api.enable_swagger)?;

    rocket = rocket.register(base_path.as_str(), catchers![app_routes::error::not_found, app_routes::error::default_catcher]);
    // Unknown paths outside the base path still get the JSON envelope.
    if base_path != "/" {
        rocket = rocket.register("/", catchers![app_routes::error::not_found, app_routes::error::default_catcher]);
    }
    Ok(rocket)
}

pub fn build_rocket(config: Config) -> Result<Rocket<Build>, AppError> {
    init_tracing(&config.logging.level, config.logging.json_format);

    let identity: SharedIdentityProvider = Arc::new(GoTrueIdentityProvider::new(&config.identity)?);
    tracing::info!(url = %config.identity.url, "identity provider configured");

    Ok(base_rocket(&config)?.manage(identity).attach(stage_db(config.database)))
}

#[cfg(test)]
pub(crate) fn assemble(config: &Config, repository: database::SharedRepository, identity: SharedIdentityProvider) -> Result<Rocket<Build>, AppError> {
    Ok(base_rocket(config)?.manage(repository).manage(identity))
}
