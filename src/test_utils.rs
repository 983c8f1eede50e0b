use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ConnectOptions, Set};

use crate::database::Database;
use crate::entities;

/// A fresh in-memory database with the schema migrated. A single pooled
/// connection keeps every query on the same in-memory file.
pub async fn test_db() -> Arc<Database> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    Arc::new(Database::connect(opt).await.unwrap())
}

/// A fixed day in the future at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, hour, minute, 0).unwrap()
}

pub async fn insert_artist(db: &Database, name: &str) -> entities::artist::Model {
    entities::artist::ActiveModel {
        name: Set(name.to_string()),
        city: Set(Some("San Francisco".to_string())),
        state: Set(Some("CA".to_string())),
        ..Default::default()
    }
    .insert(&db.conn)
    .await
    .unwrap()
}

pub async fn insert_venue(db: &Database, name: &str) -> entities::venue::Model {
    let mut venue = entities::venue::ActiveModel::new();
    venue.name = Set(name.to_string());
    venue.city = Set("San Francisco".to_string());
    venue.state = Set("CA".to_string());
    venue.address = Set("1015 Folsom Street".to_string());
    venue.insert(&db.conn).await.unwrap()
}

pub async fn insert_window(
    db: &Database,
    artist_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> entities::availability::Model {
    entities::availability::ActiveModel {
        artist_id: Set(artist_id),
        working_period_start: Set(start),
        working_period_end: Set(end),
        ..Default::default()
    }
    .insert(&db.conn)
    .await
    .unwrap()
}
