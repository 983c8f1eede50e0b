use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::database::Database;
use crate::entities;
use crate::services::error::{DirectoryError, DirectoryResult};
use crate::services::genres::encode_genres;
use crate::services::show::{load_listings, upcoming_counts};
use crate::services::views::{ArtistProfile, EntitySummary, SearchResults};

/// Everything an artist fills in when registering or editing their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistForm {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
}

impl ArtistForm {
    fn validate(&self) -> DirectoryResult<()> {
        if self.name.trim().is_empty() {
            return Err(DirectoryError::MissingField("name"));
        }
        Ok(())
    }
}

impl From<&entities::artist::Model> for ArtistForm {
    fn from(artist: &entities::artist::Model) -> Self {
        Self {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone(),
            genres: crate::services::genres::decode_genres(artist.genres.as_deref()),
            image_link: artist.image_link.clone(),
            facebook_link: artist.facebook_link.clone(),
        }
    }
}

pub struct ArtistService {
    db: Arc<Database>,
}

impl ArtistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, form: ArtistForm) -> DirectoryResult<entities::artist::Model> {
        form.validate()?;

        let artist = entities::artist::ActiveModel {
            name: Set(form.name.trim().to_string()),
            city: Set(form.city),
            state: Set(form.state),
            phone: Set(form.phone),
            genres: Set(encode_genres(&form.genres)),
            image_link: Set(form.image_link),
            facebook_link: Set(form.facebook_link),
            ..Default::default()
        }
        .insert(&self.db.conn)
        .await?;

        log::info!("Artist {} was successfully listed (ID: {})", artist.name, artist.id);
        Ok(artist)
    }

    pub async fn get(&self, id: i64) -> DirectoryResult<Option<entities::artist::Model>> {
        Ok(entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?)
    }

    /// Id and name of every artist, ordered by name.
    pub async fn list(&self) -> DirectoryResult<Vec<EntitySummary>> {
        let artists = entities::artist::Entity::find()
            .order_by_asc(entities::artist::Column::Name)
            .all(&self.db.conn)
            .await?;

        Ok(artists
            .into_iter()
            .map(|a| EntitySummary {
                id: a.id,
                name: a.name,
            })
            .collect())
    }

    /// Replaces the whole profile with `form`.
    pub async fn update(
        &self,
        id: i64,
        form: ArtistForm,
    ) -> DirectoryResult<entities::artist::Model> {
        form.validate()?;

        let artist = entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::NotFound {
                entity: "artist",
                id,
            })?;

        let mut active: entities::artist::ActiveModel = artist.into();
        active.name = Set(form.name.trim().to_string());
        active.city = Set(form.city);
        active.state = Set(form.state);
        active.phone = Set(form.phone);
        active.genres = Set(encode_genres(&form.genres));
        active.image_link = Set(form.image_link);
        active.facebook_link = Set(form.facebook_link);
        let artist = active.update(&self.db.conn).await?;

        log::info!("Artist {} was updated successfully (ID: {})", artist.name, artist.id);
        Ok(artist)
    }

    /// Deletes an artist and their availability windows. Refused while any
    /// show still references the artist.
    pub async fn delete(&self, id: i64) -> DirectoryResult<()> {
        let count = entities::show::Entity::find()
            .filter(entities::show::Column::ArtistId.eq(id))
            .count(&self.db.conn)
            .await?;
        if count > 0 {
            return Err(DirectoryError::HasDependentShows {
                entity: "artist",
                id,
                count,
            });
        }

        let result = entities::artist::Entity::delete_by_id(id)
            .exec(&self.db.conn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    DirectoryError::HasDependentShows {
                        entity: "artist",
                        id,
                        count: 1,
                    }
                }
                _ => DirectoryError::Storage(e),
            })?;

        if result.rows_affected == 0 {
            return Err(DirectoryError::NotFound {
                entity: "artist",
                id,
            });
        }

        log::info!("Artist {} deleted", id);
        Ok(())
    }

    /// Case-insensitive substring search on the artist name.
    pub async fn search(&self, term: &str, now: DateTime<Utc>) -> DirectoryResult<SearchResults> {
        let artists = entities::artist::Entity::find()
            .filter(entities::artist::Column::Name.contains(term.trim()))
            .order_by_asc(entities::artist::Column::Name)
            .all(&self.db.conn)
            .await?;

        let ids: Vec<i64> = artists.iter().map(|a| a.id).collect();
        let upcoming =
            upcoming_counts(&self.db.conn, entities::show::Column::ArtistId, &ids, now).await?;

        Ok(SearchResults::new(
            artists.into_iter().map(|a| (a.id, a.name)),
            &upcoming,
        ))
    }

    /// The artist page: profile plus upcoming and past shows.
    pub async fn profile(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> DirectoryResult<Option<ArtistProfile>> {
        let Some(artist) = self.get(id).await? else {
            return Ok(None);
        };

        let shows = load_listings(
            &self.db.conn,
            Condition::all().add(entities::show::Column::ArtistId.eq(id)),
        )
        .await?;

        Ok(Some(ArtistProfile::build(&artist, shows, now)))
    }
}
