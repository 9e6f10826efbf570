use crate::auth::CurrentUser;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::identity::SharedIdentityProvider;
use crate::models::response::SuccessResponse;
use crate::models::session::AuthResponse;
use crate::models::user::{CredentialsRequest, CurrentUserResponse, TokenRequest, UserResponse};
use crate::service::auth::AuthService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use validator::Validate;

/// Create an account and open a session
#[openapi(tag = "Authentication")]
#[post("/register", data = "<payload>")]
pub async fn register(identity: &State<SharedIdentityProvider>, payload: JsonBody<CredentialsRequest>) -> Result<(Status, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let auth = AuthService::new(identity.inner().as_ref()).register(&payload).await?;
    Ok((Status::Created, Json(AuthResponse::from(&auth))))
}

/// Log in with username and password
#[openapi(tag = "Authentication")]
#[post("/login", data = "<payload>")]
pub async fn login(identity: &State<SharedIdentityProvider>, payload: JsonBody<CredentialsRequest>) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let auth = AuthService::new(identity.inner().as_ref()).login(&payload).await?;
    Ok(Json(AuthResponse::from(&auth)))
}

/// Exchange a refresh token for a new session
#[openapi(tag = "Authentication")]
#[post("/refresh", data = "<payload>")]
pub async fn refresh(identity: &State<SharedIdentityProvider>, payload: JsonBody<TokenRequest>) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let auth = AuthService::new(identity.inner().as_ref()).refresh(&payload.token).await?;
    Ok(Json(AuthResponse::from(&auth)))
}

/// Revoke the session behind an access token
#[openapi(tag = "Authentication")]
#[post("/logout", data = "<payload>")]
pub async fn logout(identity: &State<SharedIdentityProvider>, payload: JsonBody<TokenRequest>) -> Result<Json<SuccessResponse>, AppError> {
    payload.validate()?;

    AuthService::new(identity.inner().as_ref()).sign_out(&payload.token).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// The authenticated caller
#[openapi(tag = "Authentication")]
#[get("/me")]
pub async fn me(current_user: CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: true,
        user: UserResponse::from(&current_user.user),
    })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register, login, refresh, logout, me]
}
