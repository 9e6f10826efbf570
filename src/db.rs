use crate::config::DatabaseConfig;
use crate::database::SharedRepository;
use crate::database::postgres_repository::PostgresRepository;
use rocket::fairing::AdHoc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

async fn init_pool(db_config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_config.url)
        .await
}

/// Connects the pool, applies pending migrations when enabled and manages the repository.
pub fn stage_db(db_config: DatabaseConfig) -> AdHoc {
    AdHoc::try_on_ignite("Postgres (sqlx)", |rocket| async move {
        let pool = match init_pool(&db_config).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to initialize database pool: {}", e);
                return Err(rocket);
            }
        };
        tracing::info!("Database pool initialized successfully");

        if db_config.run_migrations {
            if let Err(e) = sqlx::migrate!().run(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
                return Err(rocket);
            }
            tracing::info!("Database migrations applied");
        }

        let repository: SharedRepository = Arc::new(PostgresRepository::new(pool));
        Ok(rocket.manage(repository))
    })
}
