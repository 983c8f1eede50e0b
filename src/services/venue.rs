use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::database::Database;
use crate::entities;
use crate::services::error::{DirectoryError, DirectoryResult};
use crate::services::genres::{decode_genres, encode_genres};
use crate::services::show::{load_listings, upcoming_counts};
use crate::services::views::{
    EntitySummary, SearchHit, SearchResults, VenueArea, VenueProfile, group_by_area,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl VenueForm {
    fn validate(&self) -> DirectoryResult<()> {
        let required = [
            ("name", &self.name),
            ("city", &self.city),
            ("state", &self.state),
            ("address", &self.address),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DirectoryError::MissingField(field));
            }
        }
        Ok(())
    }

    fn apply(self, active: &mut entities::venue::ActiveModel) {
        active.name = Set(self.name.trim().to_string());
        active.city = Set(self.city.trim().to_string());
        active.state = Set(self.state.trim().to_string());
        active.address = Set(self.address.trim().to_string());
        active.phone = Set(self.phone);
        active.genres = Set(encode_genres(&self.genres));
        active.image_link = Set(self.image_link);
        active.facebook_link = Set(self.facebook_link);
        active.website = Set(self.website);
        active.seeking_talent = Set(self.seeking_talent);
        active.seeking_description = Set(self.seeking_description);
    }
}

impl From<&entities::venue::Model> for VenueForm {
    fn from(venue: &entities::venue::Model) -> Self {
        Self {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone(),
            genres: decode_genres(venue.genres.as_deref()),
            image_link: venue.image_link.clone(),
            facebook_link: venue.facebook_link.clone(),
            website: venue.website.clone(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone(),
        }
    }
}

pub struct VenueService {
    db: Arc<Database>,
}

impl VenueService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, form: VenueForm) -> DirectoryResult<entities::venue::Model> {
        form.validate()?;

        let mut active = entities::venue::ActiveModel::new();
        form.apply(&mut active);
        let venue = active.insert(&self.db.conn).await?;

        log::info!("Venue {} was successfully listed (ID: {})", venue.name, venue.id);
        Ok(venue)
    }

    pub async fn get(&self, id: i64) -> DirectoryResult<Option<entities::venue::Model>> {
        Ok(entities::venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?)
    }

    pub async fn list(&self) -> DirectoryResult<Vec<EntitySummary>> {
        let venues = entities::venue::Entity::find()
            .order_by_asc(entities::venue::Column::Name)
            .all(&self.db.conn)
            .await?;

        Ok(venues
            .into_iter()
            .map(|v| EntitySummary {
                id: v.id,
                name: v.name,
            })
            .collect())
    }

    /// All venues grouped by (city, state), with upcoming show counts.
    pub async fn list_areas(&self, now: DateTime<Utc>) -> DirectoryResult<Vec<VenueArea>> {
        let venues = entities::venue::Entity::find().all(&self.db.conn).await?;

        let ids: Vec<i64> = venues.iter().map(|v| v.id).collect();
        let upcoming =
            upcoming_counts(&self.db.conn, entities::show::Column::VenueId, &ids, now).await?;

        Ok(group_by_area(venues.into_iter().map(|v| {
            let hit = SearchHit {
                id: v.id,
                num_upcoming_shows: upcoming.get(&v.id).copied().unwrap_or(0),
                name: v.name,
            };
            ((v.city, v.state), hit)
        })))
    }

    pub async fn update(
        &self,
        id: i64,
        form: VenueForm,
    ) -> DirectoryResult<entities::venue::Model> {
        form.validate()?;

        let venue = entities::venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?
            .ok_or(DirectoryError::NotFound { entity: "venue", id })?;

        let mut active: entities::venue::ActiveModel = venue.into();
        form.apply(&mut active);
        let venue = active.update(&self.db.conn).await?;

        log::info!("Venue {} was updated successfully (ID: {})", venue.name, venue.id);
        Ok(venue)
    }

    /// Refused while any show is still booked at the venue.
    pub async fn delete(&self, id: i64) -> DirectoryResult<()> {
        let count = entities::show::Entity::find()
            .filter(entities::show::Column::VenueId.eq(id))
            .count(&self.db.conn)
            .await?;
        if count > 0 {
            return Err(DirectoryError::HasDependentShows {
                entity: "venue",
                id,
                count,
            });
        }

        let result = entities::venue::Entity::delete_by_id(id)
            .exec(&self.db.conn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    DirectoryError::HasDependentShows {
                        entity: "venue",
                        id,
                        count: 1,
                    }
                }
                _ => DirectoryError::Storage(e),
            })?;

        if result.rows_affected == 0 {
            return Err(DirectoryError::NotFound { entity: "venue", id });
        }

        log::info!("Venue {} deleted", id);
        Ok(())
    }

    pub async fn search(&self, term: &str, now: DateTime<Utc>) -> DirectoryResult<SearchResults> {
        let venues = entities::venue::Entity::find()
            .filter(entities::venue::Column::Name.contains(term.trim()))
            .order_by_asc(entities::venue::Column::Name)
            .all(&self.db.conn)
            .await?;

        let ids: Vec<i64> = venues.iter().map(|v| v.id).collect();
        let upcoming =
            upcoming_counts(&self.db.conn, entities::show::Column::VenueId, &ids, now).await?;

        Ok(SearchResults::new(
            venues.into_iter().map(|v| (v.id, v.name)),
            &upcoming,
        ))
    }

    pub async fn profile(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> DirectoryResult<Option<VenueProfile>> {
        let Some(venue) = self.get(id).await? else {
            return Ok(None);
        };

        let shows = load_listings(
            &self.db.conn,
            Condition::all().add(entities::show::Column::VenueId.eq(id)),
        )
        .await?;

        Ok(Some(VenueProfile::build(&venue, shows, now)))
    }
}
