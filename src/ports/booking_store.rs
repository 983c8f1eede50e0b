use chrono::{DateTime, Utc};
use sea_orm::DbErr;

use crate::services::availability::AvailabilityWindow;

/// Decoupled view of an artist, enough to resolve a booking reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: i64,
    pub name: String,
}

/// Decoupled view of a venue, enough to resolve a booking reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueRef {
    pub id: i64,
    pub name: String,
}

/// A show row about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShow {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: DateTime<Utc>,
    pub name: Option<String>,
}

/// Port trait wrapping the storage lookups the booking flow depends on.
///
/// Implementations live in `store` (sea-orm, works on a pool or an open
/// transaction) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_artist(&self, id: i64) -> Result<Option<ArtistRef>, DbErr>;

    async fn get_venue(&self, id: i64) -> Result<Option<VenueRef>, DbErr>;

    async fn list_availability(&self, artist_id: i64) -> Result<Vec<AvailabilityWindow>, DbErr>;

    /// Id of the show booked for `artist_id` at exactly `start_time`, if any.
    async fn find_show(
        &self,
        artist_id: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Option<i64>, DbErr>;

    /// Returns the id of the inserted show.
    async fn insert_show(&self, show: NewShow) -> Result<i64, DbErr>;
}
