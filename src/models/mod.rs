pub mod booking;
pub mod health;
pub mod member;
pub mod organization;
pub mod response;
pub mod session;
pub mod user;
pub mod workspace;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial updates, so nullable columns can be cleared.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
