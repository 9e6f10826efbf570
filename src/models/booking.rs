use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Default, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdateRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl BookingUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start_time.is_none() && self.end_time.is_none()
    }
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id,
            title: booking.title.clone(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            created_at: booking.created_at,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct BookingEnvelope {
    pub success: bool,
    pub booking: BookingResponse,
}

impl From<&Booking> for BookingEnvelope {
    fn from(booking: &Booking) -> Self {
        Self {
            success: true,
            booking: booking.into(),
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct BookingListEnvelope {
    pub success: bool,
    pub bookings: Vec<BookingResponse>,
}
