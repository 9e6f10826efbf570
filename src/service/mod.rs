pub mod auth;
pub mod booking;
pub mod membership;
pub mod organization;
pub mod workspace;
