use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities;
use crate::ports::booking_store::{ArtistRef, BookingStore, NewShow, VenueRef};
use crate::services::availability::AvailabilityWindow;

/// sea-orm backed [`BookingStore`].
///
/// Borrows whatever connection it is given, so the same lookups run against
/// the pool or inside a transaction opened by the caller.
pub struct EntityStore<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> EntityStore<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> BookingStore for EntityStore<'_, C>
where
    C: ConnectionTrait + Sync,
{
    async fn get_artist(&self, id: i64) -> Result<Option<ArtistRef>, DbErr> {
        let artist = entities::artist::Entity::find_by_id(id)
            .one(self.conn)
            .await?;

        Ok(artist.map(|a| ArtistRef {
            id: a.id,
            name: a.name,
        }))
    }

    async fn get_venue(&self, id: i64) -> Result<Option<VenueRef>, DbErr> {
        let venue = entities::venue::Entity::find_by_id(id)
            .one(self.conn)
            .await?;

        Ok(venue.map(|v| VenueRef {
            id: v.id,
            name: v.name,
        }))
    }

    async fn list_availability(&self, artist_id: i64) -> Result<Vec<AvailabilityWindow>, DbErr> {
        let windows = entities::availability::Entity::find()
            .filter(entities::availability::Column::ArtistId.eq(artist_id))
            .order_by_asc(entities::availability::Column::WorkingPeriodStart)
            .all(self.conn)
            .await?;

        Ok(windows.into_iter().map(AvailabilityWindow::from).collect())
    }

    async fn find_show(
        &self,
        artist_id: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Option<i64>, DbErr> {
        let show = entities::show::Entity::find()
            .filter(entities::show::Column::ArtistId.eq(artist_id))
            .filter(entities::show::Column::StartTime.eq(start_time))
            .one(self.conn)
            .await?;

        Ok(show.map(|s| s.id))
    }

    async fn insert_show(&self, show: NewShow) -> Result<i64, DbErr> {
        let model = entities::show::ActiveModel {
            name: Set(show.name),
            start_time: Set(show.start_time),
            venue_id: Set(show.venue_id),
            artist_id: Set(show.artist_id),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        Ok(model.id)
    }
}
