use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api/v1";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    pub api: ApiConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub enable_swagger: bool,
    /// Adds the error source chain to error responses. Keep off in production.
    pub expose_error_details: bool,
}

/// Connection settings for the hosted identity provider (GoTrue-compatible auth API).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IdentityConfig {
    pub url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/booking_gateway".to_string(),
            max_connections: 16,
            min_connections: 2,
            acquire_timeout: 5,
            run_migrations: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            enable_swagger: true,
            expose_error_details: false,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Gateway.toml (if it exists)
    /// 3. Environment variables prefixed with GATEWAY_, nested with `__`
    ///    (e.g. GATEWAY_DATABASE__MAX_CONNECTIONS)
    /// 4. DATABASE_URL, SUPABASE_URL and SUPABASE_ANON_KEY for compatibility with
    ///    existing deployments
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("Gateway.toml").nested())
            .merge(Env::prefixed("GATEWAY_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["SUPABASE_URL"]).map(|_| "identity.url".into()))
            .merge(Env::raw().only(&["SUPABASE_ANON_KEY"]).map(|_| "identity.api_key".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_versioned_base_path() {
        let config = Config::default();
        assert_eq!(config.api.base_path, "/api/v1");
        assert!(!config.api.expose_error_details);
        assert_eq!(config.identity.timeout_seconds, 10);
    }

    #[test]
    fn toml_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "Gateway.toml",
                r#"
                [database]
                max_connections = 4

                [api]
                expose_error_details = true
                "#,
            )?;

            let config = Config::load()?;
            assert_eq!(config.database.max_connections, 4);
            assert_eq!(config.database.min_connections, 2);
            assert!(config.api.expose_error_details);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("Gateway.toml", "[server]\nport = 9000\n")?;
            jail.set_env("GATEWAY_SERVER__PORT", "9100");
            jail.set_env("GATEWAY_LOGGING__JSON_FORMAT", "true");
            jail.set_env("DATABASE_URL", "postgres://db.internal/bookings");
            jail.set_env("SUPABASE_URL", "https://auth.example.com");
            jail.set_env("SUPABASE_ANON_KEY", "anon-key");

            let config = Config::load()?;
            assert_eq!(config.server.port, 9100);
            assert!(config.logging.json_format);
            assert_eq!(config.database.url, "postgres://db.internal/bookings");
            assert_eq!(config.identity.url, "https://auth.example.com");
            assert_eq!(config.identity.api_key, "anon-key");
            Ok(())
        });
    }
}
