use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::database::Database;
use crate::entities;
use crate::services::views::ShowListing;

pub struct ShowService {
    db: Arc<Database>,
}

impl ShowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All shows with their artist and venue, earliest first.
    pub async fn list_shows(&self) -> Result<Vec<ShowListing>, DbErr> {
        load_listings(&self.db.conn, Condition::all()).await
    }
}

/// Loads shows matching `filter` joined with their venue and artist, ordered
/// by start time.
pub(crate) async fn load_listings<C>(
    conn: &C,
    filter: Condition,
) -> Result<Vec<ShowListing>, DbErr>
where
    C: ConnectionTrait,
{
    let shows = entities::show::Entity::find()
        .filter(filter)
        .order_by_asc(entities::show::Column::StartTime)
        .find_also_related(entities::venue::Entity)
        .all(conn)
        .await?;

    let mut artist_ids: Vec<i64> = shows.iter().map(|(show, _)| show.artist_id).collect();
    artist_ids.sort_unstable();
    artist_ids.dedup();

    let artists: HashMap<i64, entities::artist::Model> = entities::artist::Entity::find()
        .filter(entities::artist::Column::Id.is_in(artist_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|artist| (artist.id, artist))
        .collect();

    let listings = shows
        .into_iter()
        .filter_map(|(show, venue)| {
            let Some(venue) = venue else {
                log::warn!("Show {} references missing venue {}", show.id, show.venue_id);
                return None;
            };
            let Some(artist) = artists.get(&show.artist_id) else {
                log::warn!("Show {} references missing artist {}", show.id, show.artist_id);
                return None;
            };
            Some(ShowListing {
                show_id: show.id,
                name: show.name,
                start_time: show.start_time,
                venue_id: venue.id,
                venue_name: venue.name,
                venue_image_link: venue.image_link,
                artist_id: artist.id,
                artist_name: artist.name.clone(),
                artist_image_link: artist.image_link.clone(),
            })
        })
        .collect();

    Ok(listings)
}

/// Number of shows starting after `now`, keyed by the value of `column`
/// (artist or venue id), for the given ids.
pub(crate) async fn upcoming_counts<C>(
    conn: &C,
    column: entities::show::Column,
    ids: &[i64],
    now: DateTime<Utc>,
) -> Result<HashMap<i64, u64>, DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let shows = entities::show::Entity::find()
        .filter(column.is_in(ids.iter().copied()))
        .filter(entities::show::Column::StartTime.gt(now))
        .all(conn)
        .await?;

    let mut counts = HashMap::new();
    for show in shows {
        let key = match column {
            entities::show::Column::VenueId => show.venue_id,
            _ => show.artist_id,
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    Ok(counts)
}
