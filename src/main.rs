use booking_gateway::{AppError, Config, build_rocket};

#[rocket::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    let rocket = build_rocket(config)?;

    if let Err(e) = rocket.launch().await {
        tracing::error!("Gateway stopped with an error: {}", e);
        return Err(AppError::Internal(format!("Failed to launch: {}", e)));
    }
    Ok(())
}
