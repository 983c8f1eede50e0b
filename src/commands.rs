use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Subcommand};
use color_eyre::{Result, eyre::eyre};
use serde::Serialize;

use crate::database::Database;
use crate::services::artist::{ArtistForm, ArtistService};
use crate::services::availability::{AvailabilityService, whole_seconds};
use crate::services::booking::BookingService;
use crate::services::conflict::BookingRequest;
use crate::services::error::DirectoryError;
use crate::services::show::ShowService;
use crate::services::venue::{VenueForm, VenueService};
use crate::services::views::{SearchResults, ShowListing};

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM[:SS]`, the latter read as UTC.
/// Fractions of a second are dropped.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Ok(whole_seconds(parsed.with_timezone(&Utc)));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            format!(
                "`{}` is not a valid timestamp (use RFC 3339 or YYYY-MM-DD HH:MM)",
                s
            )
        })
}

/// Prints either JSON or the human rendering.
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ArtistFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Repeat for several genres
    #[arg(long = "genre")]
    genres: Vec<String>,
    #[arg(long)]
    image_link: Option<String>,
    #[arg(long)]
    facebook_link: Option<String>,
}

impl From<ArtistFields> for ArtistForm {
    fn from(fields: ArtistFields) -> Self {
        Self {
            name: fields.name,
            city: fields.city,
            state: fields.state,
            phone: fields.phone,
            genres: fields.genres,
            image_link: fields.image_link,
            facebook_link: fields.facebook_link,
        }
    }
}

/// Fields left out keep their current value.
#[derive(Args, Debug)]
pub struct ArtistChanges {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Replaces all genres when given
    #[arg(long = "genre")]
    genres: Vec<String>,
    #[arg(long)]
    image_link: Option<String>,
    #[arg(long)]
    facebook_link: Option<String>,
}

impl ArtistChanges {
    fn apply(self, form: &mut ArtistForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if self.city.is_some() {
            form.city = self.city;
        }
        if self.state.is_some() {
            form.state = self.state;
        }
        if self.phone.is_some() {
            form.phone = self.phone;
        }
        if !self.genres.is_empty() {
            form.genres = self.genres;
        }
        if self.image_link.is_some() {
            form.image_link = self.image_link;
        }
        if self.facebook_link.is_some() {
            form.facebook_link = self.facebook_link;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ArtistCommands {
    /// List a new artist
    Create(ArtistFields),
    /// Print every artist
    List,
    /// Print an artist's profile with upcoming and past shows
    Show { id: i64 },
    /// Edit an artist's profile
    Edit {
        id: i64,
        #[command(flatten)]
        changes: ArtistChanges,
    },
    /// Delete an artist that has no shows
    Delete { id: i64 },
    /// Case-insensitive search on the artist name
    Search { term: String },
}

#[derive(Args, Debug)]
pub struct VenueFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long = "genre")]
    genres: Vec<String>,
    #[arg(long)]
    image_link: Option<String>,
    #[arg(long)]
    facebook_link: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    seeking_talent: bool,
    #[arg(long)]
    seeking_description: Option<String>,
}

impl From<VenueFields> for VenueForm {
    fn from(fields: VenueFields) -> Self {
        Self {
            name: fields.name,
            city: fields.city,
            state: fields.state,
            address: fields.address,
            phone: fields.phone,
            genres: fields.genres,
            image_link: fields.image_link,
            facebook_link: fields.facebook_link,
            website: fields.website,
            seeking_talent: fields.seeking_talent,
            seeking_description: fields.seeking_description,
        }
    }
}

#[derive(Args, Debug)]
pub struct VenueChanges {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long = "genre")]
    genres: Vec<String>,
    #[arg(long)]
    image_link: Option<String>,
    #[arg(long)]
    facebook_link: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    seeking_talent: Option<bool>,
    #[arg(long)]
    seeking_description: Option<String>,
}

impl VenueChanges {
    fn apply(self, form: &mut VenueForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(city) = self.city {
            form.city = city;
        }
        if let Some(state) = self.state {
            form.state = state;
        }
        if let Some(address) = self.address {
            form.address = address;
        }
        if self.phone.is_some() {
            form.phone = self.phone;
        }
        if !self.genres.is_empty() {
            form.genres = self.genres;
        }
        if self.image_link.is_some() {
            form.image_link = self.image_link;
        }
        if self.facebook_link.is_some() {
            form.facebook_link = self.facebook_link;
        }
        if self.website.is_some() {
            form.website = self.website;
        }
        if let Some(seeking_talent) = self.seeking_talent {
            form.seeking_talent = seeking_talent;
        }
        if self.seeking_description.is_some() {
            form.seeking_description = self.seeking_description;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum VenueCommands {
    /// List a new venue
    Create(VenueFields),
    /// Print every venue
    List,
    /// Print venues grouped by city and state
    Areas,
    /// Print a venue's page with upcoming and past shows
    Show { id: i64 },
    /// Edit a venue
    Edit {
        id: i64,
        #[command(flatten)]
        changes: VenueChanges,
    },
    /// Delete a venue that has no shows
    Delete { id: i64 },
    /// Case-insensitive search on the venue name
    Search { term: String },
}

#[derive(Subcommand, Debug)]
pub enum AvailabilityCommands {
    /// Add a window [start, end) in which the artist can be booked
    Add {
        #[arg(long)]
        artist_id: i64,
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,
    },
    /// List an artist's windows
    List {
        #[arg(long)]
        artist_id: i64,
    },
    /// Move a window
    Edit {
        id: i64,
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,
    },
    Delete { id: i64 },
    /// Check whether the artist can be booked at an instant
    Check {
        #[arg(long)]
        artist_id: i64,
        #[arg(long, value_parser = parse_timestamp)]
        at: DateTime<Utc>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowCommands {
    /// Book an artist at a venue
    Create {
        #[arg(long)]
        artist_id: i64,
        #[arg(long)]
        venue_id: i64,
        #[arg(long, value_parser = parse_timestamp)]
        start_time: DateTime<Utc>,
        #[arg(long)]
        name: Option<String>,
    },
    /// List every show ordered by start time
    List,
}

#[derive(Serialize)]
struct Created {
    id: i64,
}

fn print_search(results: &SearchResults) {
    println!("{} result(s)", results.count);
    for hit in &results.data {
        println!(
            "{:>5}  {} ({} upcoming)",
            hit.id, hit.name, hit.num_upcoming_shows
        );
    }
}

fn print_listing(show: &ShowListing) {
    println!(
        "{:>5}  {}  {} at {}",
        show.show_id,
        show.start_time.to_rfc3339(),
        show.artist_name,
        show.venue_name
    );
}

/// Client mistakes are logged at warn, storage faults at error.
fn report(err: DirectoryError) -> color_eyre::Report {
    if err.is_client_error() {
        log::warn!("{}", err);
    } else {
        log::error!("{}", err);
    }
    err.into()
}

pub async fn run_artist(command: ArtistCommands, db: Arc<Database>, out: &Output) -> Result<()> {
    let service = ArtistService::new(db);

    match command {
        ArtistCommands::Create(fields) => {
            let artist = service.create(fields.into()).await.map_err(report)?;
            out.emit(&Created { id: artist.id }, |c| {
                println!("Artist {} was successfully listed (ID: {})", artist.name, c.id)
            })?;
        }
        ArtistCommands::List => {
            let artists = service.list().await.map_err(report)?;
            out.emit(&artists, |artists| {
                for artist in artists {
                    println!("{:>5}  {}", artist.id, artist.name);
                }
            })?;
        }
        ArtistCommands::Show { id } => {
            let profile = service
                .profile(id, Utc::now())
                .await
                .map_err(report)?
                .ok_or(eyre!("Artist {} not found", id))?;
            out.emit(&profile, |p| {
                println!("{} (ID: {})", p.name, p.id);
                if let (Some(city), Some(state)) = (&p.city, &p.state) {
                    println!("  {}, {}", city, state);
                }
                if !p.genres.is_empty() {
                    println!("  Genres: {}", p.genres.join(", "));
                }
                println!("  Upcoming shows ({}):", p.upcoming_shows_count);
                p.upcoming_shows.iter().for_each(print_listing);
                println!("  Past shows ({}):", p.past_shows_count);
                p.past_shows.iter().for_each(print_listing);
            })?;
        }
        ArtistCommands::Edit { id, changes } => {
            let existing = service
                .get(id)
                .await
                .map_err(report)?
                .ok_or(eyre!("Artist {} not found", id))?;
            let mut form = ArtistForm::from(&existing);
            changes.apply(&mut form);
            let artist = service.update(id, form).await.map_err(report)?;
            out.emit(&Created { id: artist.id }, |_| {
                println!("Artist {} was updated successfully", artist.name)
            })?;
        }
        ArtistCommands::Delete { id } => {
            service.delete(id).await.map_err(report)?;
            out.emit(&Created { id }, |_| println!("Artist {} deleted", id))?;
        }
        ArtistCommands::Search { term } => {
            let results = service.search(&term, Utc::now()).await.map_err(report)?;
            out.emit(&results, print_search)?;
        }
    }

    Ok(())
}

pub async fn run_venue(command: VenueCommands, db: Arc<Database>, out: &Output) -> Result<()> {
    let service = VenueService::new(db);

    match command {
        VenueCommands::Create(fields) => {
            let venue = service.create(fields.into()).await.map_err(report)?;
            out.emit(&Created { id: venue.id }, |c| {
                println!("Venue {} was successfully listed (ID: {})", venue.name, c.id)
            })?;
        }
        VenueCommands::List => {
            let venues = service.list().await.map_err(report)?;
            out.emit(&venues, |venues| {
                for venue in venues {
                    println!("{:>5}  {}", venue.id, venue.name);
                }
            })?;
        }
        VenueCommands::Areas => {
            let areas = service.list_areas(Utc::now()).await.map_err(report)?;
            out.emit(&areas, |areas| {
                for area in areas {
                    println!("{}, {}", area.city, area.state);
                    for venue in &area.venues {
                        println!(
                            "  {:>5}  {} ({} upcoming)",
                            venue.id, venue.name, venue.num_upcoming_shows
                        );
                    }
                }
            })?;
        }
        VenueCommands::Show { id } => {
            let profile = service
                .profile(id, Utc::now())
                .await
                .map_err(report)?
                .ok_or(eyre!("Venue {} not found", id))?;
            out.emit(&profile, |p| {
                println!("{} (ID: {})", p.name, p.id);
                println!("  {}, {}, {}", p.address, p.city, p.state);
                if !p.genres.is_empty() {
                    println!("  Genres: {}", p.genres.join(", "));
                }
                if p.seeking_talent {
                    println!(
                        "  Seeking talent: {}",
                        p.seeking_description.as_deref().unwrap_or("yes")
                    );
                }
                println!("  Upcoming shows ({}):", p.upcoming_shows_count);
                p.upcoming_shows.iter().for_each(print_listing);
                println!("  Past shows ({}):", p.past_shows_count);
                p.past_shows.iter().for_each(print_listing);
            })?;
        }
        VenueCommands::Edit { id, changes } => {
            let existing = service
                .get(id)
                .await
                .map_err(report)?
                .ok_or(eyre!("Venue {} not found", id))?;
            let mut form = VenueForm::from(&existing);
            changes.apply(&mut form);
            let venue = service.update(id, form).await.map_err(report)?;
            out.emit(&Created { id: venue.id }, |_| {
                println!("Venue {} was updated successfully", venue.name)
            })?;
        }
        VenueCommands::Delete { id } => {
            service.delete(id).await.map_err(report)?;
            out.emit(&Created { id }, |_| println!("Venue {} deleted", id))?;
        }
        VenueCommands::Search { term } => {
            let results = service.search(&term, Utc::now()).await.map_err(report)?;
            out.emit(&results, print_search)?;
        }
    }

    Ok(())
}

pub async fn run_availability(
    command: AvailabilityCommands,
    db: Arc<Database>,
    out: &Output,
) -> Result<()> {
    let service = AvailabilityService::new(db);

    match command {
        AvailabilityCommands::Add {
            artist_id,
            start,
            end,
        } => {
            let window = service
                .add_window(artist_id, start, end)
                .await
                .map_err(report)?;
            out.emit(&window, |w| println!("Window {} added", w.id))?;
        }
        AvailabilityCommands::List { artist_id } => {
            let windows = service.list_windows(artist_id).await.map_err(report)?;
            out.emit(&windows, |windows| {
                for w in windows {
                    println!(
                        "{:>5}  {} .. {}",
                        w.id,
                        w.start.to_rfc3339(),
                        w.end.to_rfc3339()
                    );
                }
            })?;
        }
        AvailabilityCommands::Edit { id, start, end } => {
            let window = service.update_window(id, start, end).await.map_err(report)?;
            out.emit(&window, |w| println!("Window {} updated", w.id))?;
        }
        AvailabilityCommands::Delete { id } => {
            service.delete_window(id).await.map_err(report)?;
            out.emit(&Created { id }, |_| println!("Window {} deleted", id))?;
        }
        AvailabilityCommands::Check { artist_id, at } => {
            let available = service.is_available(artist_id, at).await.map_err(report)?;
            out.emit(&available, |available| {
                if *available {
                    println!("Artist {} is available at {}", artist_id, at.to_rfc3339());
                } else {
                    println!("Artist {} is not available at {}", artist_id, at.to_rfc3339());
                }
            })?;
        }
    }

    Ok(())
}

pub async fn run_show(command: ShowCommands, db: Arc<Database>, out: &Output) -> Result<()> {
    match command {
        ShowCommands::Create {
            artist_id,
            venue_id,
            start_time,
            name,
        } => {
            let id = BookingService::new(db)
                .book(BookingRequest::new(artist_id, venue_id, start_time), name)
                .await
                .map_err(|reason| eyre!("{} [{}]", reason, reason.code()))?;
            out.emit(&Created { id }, |c| {
                println!("Show was successfully listed (ID: {})", c.id)
            })?;
        }
        ShowCommands::List => {
            let shows = ShowService::new(db).list_shows().await?;
            out.emit(&shows, |shows| shows.iter().for_each(print_listing))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, insert_artist, insert_venue, insert_window, test_db};
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2030, 6, 1, 15, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2030-06-01T15:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2030-06-01T17:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2030-06-01 15:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2030-06-01 15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2030-06-01T15:00:00.700Z").unwrap(), expected);
        assert!(parse_timestamp("next tuesday").is_err());
        assert!(parse_timestamp("2030-13-01 15:00").is_err());
    }

    #[test]
    fn test_artist_changes_keep_untouched_fields() {
        let mut form = ArtistForm {
            name: "Guns N Petals".into(),
            city: Some("San Francisco".into()),
            genres: vec!["Rock n Roll".into()],
            ..Default::default()
        };

        ArtistChanges {
            name: None,
            city: Some("Oakland".into()),
            state: None,
            phone: None,
            genres: vec![],
            image_link: None,
            facebook_link: None,
        }
        .apply(&mut form);

        assert_eq!(form.name, "Guns N Petals");
        assert_eq!(form.city.as_deref(), Some("Oakland"));
        assert_eq!(form.genres, vec!["Rock n Roll".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_booking_is_an_error() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Guns N Petals").await;
        let venue = insert_venue(&db, "The Musical Hop").await;
        insert_window(&db, artist.id, at(14, 0), at(16, 0)).await;
        let out = Output { json: true };

        let create = |start_time| ShowCommands::Create {
            artist_id: artist.id,
            venue_id: venue.id,
            start_time,
            name: None,
        };

        run_show(create(at(15, 0)), db.clone(), &out).await.unwrap();

        let err = run_show(create(at(17, 0)), db.clone(), &out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ARTIST_UNAVAILABLE"));

        let err = run_show(create(at(15, 0)), db.clone(), &out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ARTIST_ALREADY_BOOKED"));
    }
}
