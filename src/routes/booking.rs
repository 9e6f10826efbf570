use crate::auth::CurrentUser;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::booking::{BookingEnvelope, BookingListEnvelope, BookingRequest, BookingResponse, BookingUpdateRequest};
use crate::models::response::MessageResponse;
use crate::routes::parse_uuid;
use crate::service::booking::BookingService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, patch, post};
use rocket_okapi::openapi;
use validator::Validate;

/// Create a booking hosted by the caller
#[openapi(tag = "Bookings")]
#[post("/", data = "<payload>")]
pub async fn create_booking(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    payload: JsonBody<BookingRequest>,
) -> Result<(Status, Json<BookingEnvelope>), AppError> {
    payload.validate()?;

    let booking = BookingService::new(repo.inner().as_ref()).create_booking(&current_user.id, &payload).await?;
    Ok((Status::Created, Json(BookingEnvelope::from(&booking))))
}

/// List the caller's bookings, earliest first
#[openapi(tag = "Bookings")]
#[get("/")]
pub async fn list_bookings(repo: &State<SharedRepository>, current_user: CurrentUser) -> Result<Json<BookingListEnvelope>, AppError> {
    let bookings = BookingService::new(repo.inner().as_ref()).list_bookings(&current_user.id).await?;
    Ok(Json(BookingListEnvelope {
        success: true,
        bookings: bookings.iter().map(BookingResponse::from).collect(),
    }))
}

/// Get one of the caller's bookings
#[openapi(tag = "Bookings")]
#[get("/<id>")]
pub async fn get_booking(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<BookingEnvelope>, AppError> {
    let booking_id = parse_uuid(id, "booking id")?;

    let booking = BookingService::new(repo.inner().as_ref()).get_booking(&booking_id, &current_user.id).await?;
    Ok(Json(BookingEnvelope::from(&booking)))
}

/// Partially update one of the caller's bookings
#[openapi(tag = "Bookings")]
#[patch("/<id>", data = "<payload>")]
pub async fn update_booking(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<BookingUpdateRequest>,
) -> Result<Json<BookingEnvelope>, AppError> {
    payload.validate()?;
    let booking_id = parse_uuid(id, "booking id")?;

    let booking = BookingService::new(repo.inner().as_ref())
        .update_booking(&booking_id, &current_user.id, &payload)
        .await?;
    Ok(Json(BookingEnvelope::from(&booking)))
}

/// Delete one of the caller's bookings
#[openapi(tag = "Bookings")]
#[delete("/<id>")]
pub async fn delete_booking(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let booking_id = parse_uuid(id, "booking id")?;

    BookingService::new(repo.inner().as_ref()).delete_booking(&booking_id, &current_user.id).await?;
    Ok(Json(MessageResponse::new("Booking deleted")))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_booking, list_bookings, get_booking, update_booking, delete_booking]
}
