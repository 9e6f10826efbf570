use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::booking::{Booking, BookingRequest, BookingUpdateRequest};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, user_id: &Uuid, request: &BookingRequest) -> Result<Booking, AppError>;
    async fn get_booking_by_id(&self, id: &Uuid) -> Result<Option<Booking>, AppError>;
    /// Ordered by start time, earliest first.
    async fn list_bookings_for_user(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError>;
    async fn update_booking(&self, id: &Uuid, request: &BookingUpdateRequest) -> Result<Booking, AppError>;
    async fn delete_booking(&self, id: &Uuid) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl BookingRepository for PostgresRepository {
    async fn create_booking(&self, user_id: &Uuid, request: &BookingRequest) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (user_id, title, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, start_time, end_time, created_at
            "#,
        )
        .bind(user_id)
        .bind(&request.title)
        .bind(request.start_time)
        .bind(request.end_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn get_booking_by_id(&self, id: &Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, title, start_time, end_time, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn list_bookings_for_user(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, title, start_time, end_time, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY start_time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn update_booking(&self, id: &Uuid, request: &BookingUpdateRequest) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET title = COALESCE($2, title),
                start_time = COALESCE($3, start_time),
                end_time = COALESCE($4, end_time)
            WHERE id = $1
            RETURNING id, user_id, title, start_time, end_time, created_at
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(request.start_time)
        .bind(request.end_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn delete_booking(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }
        Ok(())
    }
}
