use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::database::booking::BookingRepository;
use crate::error::app_error::AppError;
use crate::models::booking::{Booking, BookingRequest, BookingUpdateRequest};

pub struct BookingService<'a, R: BookingRepository + ?Sized> {
    repository: &'a R,
}

fn ensure_interval(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<(), AppError> {
    if start_time >= end_time {
        return Err(AppError::Invariant("Start time must be before end time".to_string()));
    }
    Ok(())
}

impl<'a, R: BookingRepository + ?Sized> BookingService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        BookingService { repository }
    }

    pub async fn create_booking(&self, user_id: &Uuid, request: &BookingRequest) -> Result<Booking, AppError> {
        ensure_interval(request.start_time, request.end_time)?;

        let booking = self.repository.create_booking(user_id, request).await?;
        info!(booking_id = %booking.id, user_id = %user_id, "booking created");
        Ok(booking)
    }

    /// The booking, if it exists and belongs to `user_id`.
    pub async fn get_booking(&self, id: &Uuid, user_id: &Uuid) -> Result<Booking, AppError> {
        let booking = self
            .repository
            .get_booking_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.user_id != *user_id {
            return Err(AppError::Forbidden("You don't have access to this booking".to_string()));
        }
        Ok(booking)
    }

    pub async fn list_bookings(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        self.repository.list_bookings_for_user(user_id).await
    }

    pub async fn update_booking(&self, id: &Uuid, user_id: &Uuid, request: &BookingUpdateRequest) -> Result<Booking, AppError> {
        let existing = self.get_booking(id, user_id).await?;
        if request.is_empty() {
            return Ok(existing);
        }

        let start_time = request.start_time.unwrap_or(existing.start_time);
        let end_time = request.end_time.unwrap_or(existing.end_time);
        ensure_interval(start_time, end_time)?;

        let booking = self.repository.update_booking(id, request).await?;
        info!(booking_id = %booking.id, user_id = %user_id, "booking updated");
        Ok(booking)
    }

    pub async fn delete_booking(&self, id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        self.get_booking(id, user_id).await?;
        self.repository.delete_booking(id).await?;
        info!(booking_id = %id, user_id = %user_id, "booking deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryRepository;
    use chrono::Duration;

    fn request(title: &str, start: DateTime<Utc>, minutes: i64) -> BookingRequest {
        BookingRequest {
            title: title.to_string(),
            start_time: start,
            end_time: start + Duration::minutes(minutes),
        }
    }

    #[rocket::async_test]
    async fn empty_interval_is_rejected_and_nothing_is_stored() {
        let repo = InMemoryRepository::default();
        let service = BookingService::new(&repo);
        let user = Uuid::new_v4();
        let start = Utc::now();

        for minutes in [0, -30] {
            let result = service.create_booking(&user, &request("Broken", start, minutes)).await;
            assert!(matches!(result, Err(AppError::Invariant(_))));
        }
        assert!(service.list_bookings(&user).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn created_booking_reads_back_identically() {
        let repo = InMemoryRepository::default();
        let service = BookingService::new(&repo);
        let user = Uuid::new_v4();

        let created = service.create_booking(&user, &request("Standup", Utc::now(), 15)).await.unwrap();
        let fetched = service.get_booking(&created.id, &user).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[rocket::async_test]
    async fn other_users_cannot_touch_a_booking() {
        let repo = InMemoryRepository::default();
        let service = BookingService::new(&repo);
        let host = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let booking = service.create_booking(&host, &request("1:1", Utc::now(), 30)).await.unwrap();

        assert!(matches!(service.get_booking(&booking.id, &stranger).await, Err(AppError::Forbidden(_))));
        assert!(matches!(service.delete_booking(&booking.id, &stranger).await, Err(AppError::Forbidden(_))));
        assert!(matches!(service.get_booking(&Uuid::new_v4(), &host).await, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn update_checks_the_merged_interval() {
        let repo = InMemoryRepository::default();
        let service = BookingService::new(&repo);
        let user = Uuid::new_v4();
        let start = Utc::now();
        let booking = service.create_booking(&user, &request("Review", start, 60)).await.unwrap();

        let patch = BookingUpdateRequest {
            end_time: Some(start - Duration::minutes(5)),
            ..Default::default()
        };
        assert!(matches!(service.update_booking(&booking.id, &user, &patch).await, Err(AppError::Invariant(_))));

        let patch = BookingUpdateRequest {
            title: Some("Design review".to_string()),
            end_time: Some(start + Duration::minutes(90)),
            ..Default::default()
        };
        let updated = service.update_booking(&booking.id, &user, &patch).await.unwrap();
        assert_eq!(updated.title, "Design review");
        assert_eq!(updated.start_time, booking.start_time);
        assert_eq!(updated.end_time, start + Duration::minutes(90));
    }

    #[rocket::async_test]
    async fn bookings_are_listed_by_start_time() {
        let repo = InMemoryRepository::default();
        let service = BookingService::new(&repo);
        let user = Uuid::new_v4();
        let now = Utc::now();

        service.create_booking(&user, &request("Later", now + Duration::hours(2), 30)).await.unwrap();
        service.create_booking(&user, &request("Sooner", now, 30)).await.unwrap();
        service.create_booking(&Uuid::new_v4(), &request("Someone else", now, 30)).await.unwrap();

        let titles: Vec<String> = service.list_bookings(&user).await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Sooner".to_string(), "Later".to_string()]);
    }
}
