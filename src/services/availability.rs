use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, Set};
use serde::Serialize;

use crate::database::Database;
use crate::entities;
use crate::ports::booking_store::BookingStore;
use crate::services::error::{DirectoryError, DirectoryResult};
use crate::store::EntityStore;

/// Bookings, availability bounds and lookups all compare at whole-second
/// precision. Sub-second input is truncated.
pub fn whole_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// A half-open window `[start, end)` during which an artist can be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    pub id: i64,
    pub artist_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityWindow {
    /// Start is inclusive, end is exclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let instant = whole_seconds(instant);
        whole_seconds(self.start) <= instant && instant < whole_seconds(self.end)
    }
}

impl From<entities::availability::Model> for AvailabilityWindow {
    fn from(model: entities::availability::Model) -> Self {
        Self {
            id: model.id,
            artist_id: model.artist_id,
            start: model.working_period_start,
            end: model.working_period_end,
        }
    }
}

/// Windows are OR'd together: overlapping rows are fine, any covering window
/// is enough. No windows means never available.
pub fn covers(windows: &[AvailabilityWindow], instant: DateTime<Utc>) -> bool {
    windows.iter().any(|window| window.contains(instant))
}

/// Is `artist_id` bookable at `instant`?
pub async fn is_available<S>(
    store: &S,
    artist_id: i64,
    instant: DateTime<Utc>,
) -> Result<bool, DbErr>
where
    S: BookingStore + ?Sized,
{
    let windows = store.list_availability(artist_id).await?;
    Ok(covers(&windows, instant))
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> DirectoryResult<()> {
    if start >= end {
        return Err(DirectoryError::InvalidWindow { start, end });
    }
    Ok(())
}

pub struct AvailabilityService {
    db: Arc<Database>,
}

impl AvailabilityService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn add_window(
        &self,
        artist_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DirectoryResult<AvailabilityWindow> {
        let (start, end) = (whole_seconds(start), whole_seconds(end));
        validate_window(start, end)?;

        entities::artist::Entity::find_by_id(artist_id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::NotFound {
                entity: "artist",
                id: artist_id,
            })?;

        let model = entities::availability::ActiveModel {
            working_period_start: Set(start),
            working_period_end: Set(end),
            artist_id: Set(artist_id),
            ..Default::default()
        }
        .insert(&self.db.conn)
        .await?;

        log::info!(
            "Availability window {} added for artist {}: {} -> {}",
            model.id,
            artist_id,
            start,
            end
        );
        Ok(model.into())
    }

    pub async fn list_windows(&self, artist_id: i64) -> DirectoryResult<Vec<AvailabilityWindow>> {
        let store = EntityStore::new(&self.db.conn);
        Ok(store.list_availability(artist_id).await?)
    }

    pub async fn update_window(
        &self,
        window_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DirectoryResult<AvailabilityWindow> {
        let (start, end) = (whole_seconds(start), whole_seconds(end));
        validate_window(start, end)?;

        let window = entities::availability::Entity::find_by_id(window_id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::NotFound {
                entity: "availability window",
                id: window_id,
            })?;

        let mut active: entities::availability::ActiveModel = window.into();
        active.working_period_start = Set(start);
        active.working_period_end = Set(end);
        let model = active.update(&self.db.conn).await?;

        log::info!("Availability window {} moved to {} -> {}", window_id, start, end);
        Ok(model.into())
    }

    pub async fn delete_window(&self, window_id: i64) -> DirectoryResult<()> {
        let result = entities::availability::Entity::delete_by_id(window_id)
            .exec(&self.db.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DirectoryError::NotFound {
                entity: "availability window",
                id: window_id,
            });
        }

        log::info!("Availability window {} deleted", window_id);
        Ok(())
    }

    pub async fn is_available(
        &self,
        artist_id: i64,
        instant: DateTime<Utc>,
    ) -> DirectoryResult<bool> {
        let store = EntityStore::new(&self.db.conn);
        Ok(is_available(&store, artist_id, instant).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, insert_artist, insert_window, test_db};

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> AvailabilityWindow {
        AvailabilityWindow {
            id: 1,
            artist_id: 1,
            start,
            end,
        }
    }

    #[test]
    fn test_window_is_half_open() {
        let windows = [window(at(10, 0), at(12, 0))];

        assert!(covers(&windows, at(10, 0)));
        assert!(covers(&windows, at(11, 59)));
        assert!(!covers(&windows, at(12, 0)));
        assert!(!covers(&windows, at(9, 59)));
    }

    #[test]
    fn test_no_windows_never_available() {
        for hour in 0..24 {
            assert!(!covers(&[], at(hour, 0)));
            assert!(!covers(&[], at(hour, 30)));
        }
    }

    #[test]
    fn test_overlapping_windows_are_ored() {
        let windows = [window(at(10, 0), at(12, 0)), window(at(11, 0), at(14, 0))];

        assert!(covers(&windows, at(11, 30)));
        assert!(covers(&windows, at(12, 0)));
        assert!(!covers(&windows, at(14, 0)));
    }

    #[tokio::test]
    async fn test_is_available_reads_artist_windows() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Matt Quevedo").await;
        insert_window(&db, artist.id, at(10, 0), at(12, 0)).await;

        let service = AvailabilityService::new(db);

        assert!(service.is_available(artist.id, at(10, 0)).await.unwrap());
        assert!(service.is_available(artist.id, at(11, 59)).await.unwrap());
        assert!(!service.is_available(artist.id, at(12, 0)).await.unwrap());
        assert!(!service.is_available(artist.id, at(9, 59)).await.unwrap());
    }

    #[tokio::test]
    async fn test_artist_without_windows_is_unavailable() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Matt Quevedo").await;

        let service = AvailabilityService::new(db);

        assert!(!service.is_available(artist.id, at(10, 0)).await.unwrap());
        assert!(!service.is_available(999, at(10, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_window_rejects_inverted_range() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Matt Quevedo").await;
        let service = AvailabilityService::new(db);

        let result = service.add_window(artist.id, at(12, 0), at(10, 0)).await;
        assert!(matches!(result, Err(DirectoryError::InvalidWindow { .. })));

        let result = service.add_window(artist.id, at(12, 0), at(12, 0)).await;
        assert!(matches!(result, Err(DirectoryError::InvalidWindow { .. })));

        assert!(service.list_windows(artist.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_window_bounds_are_stored_in_whole_seconds() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Matt Quevedo").await;
        let service = AvailabilityService::new(db);

        let added = service
            .add_window(
                artist.id,
                at(10, 0) + chrono::Duration::milliseconds(500),
                at(12, 0) + chrono::Duration::milliseconds(900),
            )
            .await
            .unwrap();

        assert_eq!(added.start, at(10, 0));
        assert_eq!(added.end, at(12, 0));
        assert!(
            service
                .is_available(artist.id, at(10, 0) + chrono::Duration::milliseconds(100))
                .await
                .unwrap()
        );

        let result = service
            .add_window(
                artist.id,
                at(13, 0) + chrono::Duration::milliseconds(100),
                at(13, 0) + chrono::Duration::milliseconds(800),
            )
            .await;
        assert!(matches!(result, Err(DirectoryError::InvalidWindow { .. })));
    }

    #[tokio::test]
    async fn test_add_window_requires_artist() {
        let db = test_db().await;
        let service = AvailabilityService::new(db);

        let result = service.add_window(999, at(10, 0), at(12, 0)).await;
        assert!(matches!(
            result,
            Err(DirectoryError::NotFound {
                entity: "artist",
                id: 999
            })
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_window() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Matt Quevedo").await;
        let service = AvailabilityService::new(db);

        let added = service
            .add_window(artist.id, at(10, 0), at(12, 0))
            .await
            .unwrap();
        let moved = service
            .update_window(added.id, at(18, 0), at(22, 0))
            .await
            .unwrap();

        assert_eq!(moved.id, added.id);
        assert!(!service.is_available(artist.id, at(11, 0)).await.unwrap());
        assert!(service.is_available(artist.id, at(19, 0)).await.unwrap());

        service.delete_window(added.id).await.unwrap();
        assert!(service.list_windows(artist.id).await.unwrap().is_empty());

        let result = service.delete_window(added.id).await;
        assert!(matches!(result, Err(DirectoryError::NotFound { .. })));
    }
}
