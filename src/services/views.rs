//! Read-only views derived from stored rows. Nothing here touches the
//! database or mutates an entity; callers load rows and pass them in.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities;
use crate::services::genres::decode_genres;

/// One show joined with the names of its artist and venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowListing {
    pub show_id: i64,
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShowTimeline {
    pub upcoming: Vec<ShowListing>,
    pub past: Vec<ShowListing>,
}

/// Splits shows around `now`. A show starting exactly at `now` counts as past.
pub fn partition_shows(mut shows: Vec<ShowListing>, now: DateTime<Utc>) -> ShowTimeline {
    shows.sort_by_key(|show| show.start_time);
    let (upcoming, past) = shows.into_iter().partition(|show| show.start_time > now);
    ShowTimeline { upcoming, past }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<SearchHit>,
}

impl SearchResults {
    pub fn new(
        matches: impl IntoIterator<Item = (i64, String)>,
        upcoming: &HashMap<i64, u64>,
    ) -> Self {
        let data: Vec<SearchHit> = matches
            .into_iter()
            .map(|(id, name)| SearchHit {
                id,
                name,
                num_upcoming_shows: upcoming.get(&id).copied().unwrap_or(0),
            })
            .collect();
        Self {
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistProfile {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub upcoming_shows: Vec<ShowListing>,
    pub past_shows: Vec<ShowListing>,
    pub upcoming_shows_count: usize,
    pub past_shows_count: usize,
}

impl ArtistProfile {
    pub fn build(
        artist: &entities::artist::Model,
        shows: Vec<ShowListing>,
        now: DateTime<Utc>,
    ) -> Self {
        let timeline = partition_shows(shows, now);
        Self {
            id: artist.id,
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone(),
            genres: decode_genres(artist.genres.as_deref()),
            image_link: artist.image_link.clone(),
            facebook_link: artist.facebook_link.clone(),
            upcoming_shows_count: timeline.upcoming.len(),
            past_shows_count: timeline.past.len(),
            upcoming_shows: timeline.upcoming,
            past_shows: timeline.past,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueProfile {
    pub id: i64,
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
    pub upcoming_shows: Vec<ShowListing>,
    pub past_shows: Vec<ShowListing>,
    pub upcoming_shows_count: usize,
    pub past_shows_count: usize,
}

impl VenueProfile {
    pub fn build(
        venue: &entities::venue::Model,
        shows: Vec<ShowListing>,
        now: DateTime<Utc>,
    ) -> Self {
        let timeline = partition_shows(shows, now);
        Self {
            id: venue.id,
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
            upcoming_shows_count: timeline.upcoming.len(),
            past_shows_count: timeline.past.len(),
            upcoming_shows: timeline.upcoming,
            past_shows: timeline.past,
        }
    }
}

/// Venues sharing a city and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueArea {
    pub city: String,
    pub state: String,
    pub venues: Vec<SearchHit>,
}

/// Groups venue hits keyed by (city, state). Areas and the venues within
/// them come back sorted by name.
pub fn group_by_area(
    venues: impl IntoIterator<Item = ((String, String), SearchHit)>,
) -> Vec<VenueArea> {
    let mut areas: BTreeMap<(String, String), Vec<SearchHit>> = BTreeMap::new();
    for (area, hit) in venues {
        areas.entry(area).or_default().push(hit);
    }

    areas
        .into_iter()
        .map(|((city, state), mut venues)| {
            venues.sort_by(|a, b| a.name.cmp(&b.name));
            VenueArea {
                city,
                state,
                venues,
            }
        })
        .collect()
}
