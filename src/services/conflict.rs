use chrono::{DateTime, Utc};
use sea_orm::DbErr;

use crate::ports::booking_store::BookingStore;
use crate::services::availability;

/// A proposed show: who plays, where, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRequest {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: DateTime<Utc>,
}

impl BookingRequest {
    /// Start times are kept at whole-second precision, the same precision
    /// availability windows are compared at.
    pub fn new(artist_id: i64, venue_id: i64, start_time: DateTime<Utc>) -> Self {
        Self {
            artist_id,
            venue_id,
            start_time: availability::whole_seconds(start_time),
        }
    }
}

/// Why a booking was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("The artist is not available at the requested time")]
    ArtistUnavailable,
    #[error("The artist is already booked for a show at the requested time")]
    ArtistAlreadyBooked,
    #[error("Invalid artist or venue ID")]
    InvalidReference,
    /// Carries the storage error for logging; the message shown to users is
    /// generic.
    #[error(
        "An error occurred. Show could not be listed due to a database issue, please try again later"
    )]
    Persistence(String),
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::ArtistUnavailable => "ARTIST_UNAVAILABLE",
            RejectionReason::ArtistAlreadyBooked => "ARTIST_ALREADY_BOOKED",
            RejectionReason::InvalidReference => "INVALID_REFERENCE",
            RejectionReason::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected(RejectionReason),
}

/// Decides whether a [`BookingRequest`] may become a show.
///
/// Gates run cheapest first and stop at the first rejection:
/// references, then availability, then double booking. Business-rule
/// failures come back as [`Decision::Rejected`]; only storage faults are
/// errors.
pub struct ConflictChecker<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> ConflictChecker<'s, S>
where
    S: BookingStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn check(&self, request: &BookingRequest) -> Result<Decision, DbErr> {
        let artist = self.store.get_artist(request.artist_id).await?;
        let venue = self.store.get_venue(request.venue_id).await?;
        let (artist, venue) = match (artist, venue) {
            (Some(artist), Some(venue)) => (artist, venue),
            (artist, venue) => {
                log::debug!(
                    "Booking rejected: artist {} found: {}, venue {} found: {}",
                    request.artist_id,
                    artist.is_some(),
                    request.venue_id,
                    venue.is_some()
                );
                return Ok(Decision::Rejected(RejectionReason::InvalidReference));
            }
        };

        if !availability::is_available(self.store, request.artist_id, request.start_time).await? {
            log::debug!(
                "Booking rejected: artist {} has no availability window covering {}",
                request.artist_id,
                request.start_time
            );
            return Ok(Decision::Rejected(RejectionReason::ArtistUnavailable));
        }

        // Exact instant match on the artist only. Venue and show duration are
        // not part of the conflict predicate.
        if let Some(show_id) = self
            .store
            .find_show(request.artist_id, request.start_time)
            .await?
        {
            log::debug!(
                "Booking rejected: artist {} already has show {} at {}",
                request.artist_id,
                show_id,
                request.start_time
            );
            return Ok(Decision::Rejected(RejectionReason::ArtistAlreadyBooked));
        }

        log::debug!(
            "Booking approved: {} ({}) at {} ({}) for {}",
            artist.name,
            artist.id,
            venue.name,
            venue.id,
            request.start_time
        );
        Ok(Decision::Approved)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ports::booking_store::{ArtistRef, MockBookingStore, VenueRef};
    use crate::services::availability::AvailabilityWindow;
    use crate::test_utils::at;

    fn artist(id: i64) -> Option<ArtistRef> {
        Some(ArtistRef {
            id,
            name: "Guns N Petals".into(),
        })
    }

    fn venue(id: i64) -> Option<VenueRef> {
        Some(VenueRef {
            id,
            name: "The Musical Hop".into(),
        })
    }

    fn afternoon(artist_id: i64) -> Vec<AvailabilityWindow> {
        vec![AvailabilityWindow {
            id: 1,
            artist_id,
            start: at(14, 0),
            end: at(16, 0),
        }]
    }

    #[tokio::test]
    async fn test_approves_available_unbooked_artist() {
        let mut store = MockBookingStore::new();
        store.expect_get_artist().returning(|id| Ok(artist(id)));
        store.expect_get_venue().returning(|id| Ok(venue(id)));
        store
            .expect_list_availability()
            .returning(|id| Ok(afternoon(id)));
        store.expect_find_show().returning(|_, _| Ok(None));

        let decision = ConflictChecker::new(&store)
            .check(&BookingRequest::new(1, 1, at(15, 0)))
            .await
            .unwrap();

        assert_eq!(decision, Decision::Approved);
    }

    #[tokio::test]
    async fn test_missing_artist_short_circuits_later_gates() {
        let mut store = MockBookingStore::new();
        store.expect_get_artist().returning(|_| Ok(None));
        store.expect_get_venue().returning(|id| Ok(venue(id)));
        store.expect_list_availability().never();
        store.expect_find_show().never();

        let decision = ConflictChecker::new(&store)
            .check(&BookingRequest::new(999, 1, at(15, 0)))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Rejected(RejectionReason::InvalidReference)
        );
    }

    #[tokio::test]
    async fn test_missing_venue_is_invalid_reference() {
        let mut store = MockBookingStore::new();
        store.expect_get_artist().returning(|id| Ok(artist(id)));
        store.expect_get_venue().returning(|_| Ok(None));
        store.expect_list_availability().never();
        store.expect_find_show().never();

        let decision = ConflictChecker::new(&store)
            .check(&BookingRequest::new(1, 999, at(15, 0)))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Rejected(RejectionReason::InvalidReference)
        );
    }

    #[tokio::test]
    async fn test_unavailable_artist_skips_booking_lookup() {
        let mut store = MockBookingStore::new();
        store.expect_get_artist().returning(|id| Ok(artist(id)));
        store.expect_get_venue().returning(|id| Ok(venue(id)));
        store
            .expect_list_availability()
            .returning(|id| Ok(afternoon(id)));
        store.expect_find_show().never();

        let decision = ConflictChecker::new(&store)
            .check(&BookingRequest::new(1, 1, at(17, 0)))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Rejected(RejectionReason::ArtistUnavailable)
        );
    }

    #[tokio::test]
    async fn test_window_end_is_not_bookable() {
        let mut store = MockBookingStore::new();
        store.expect_get_artist().returning(|id| Ok(artist(id)));
        store.expect_get_venue().returning(|id| Ok(venue(id)));
        store
            .expect_list_availability()
            .returning(|id| Ok(afternoon(id)));
        store.expect_find_show().never();

        let decision = ConflictChecker::new(&store)
            .check(&BookingRequest::new(1, 1, at(16, 0)))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Rejected(RejectionReason::ArtistUnavailable)
        );
    }

    #[tokio::test]
    async fn test_existing_show_at_same_instant_rejects() {
        let mut store = MockBookingStore::new();
        store.expect_get_artist().returning(|id| Ok(artist(id)));
        store.expect_get_venue().returning(|id| Ok(venue(id)));
        store
            .expect_list_availability()
            .returning(|id| Ok(afternoon(id)));
        store
            .expect_find_show()
            .withf(|artist_id, start_time| *artist_id == 1 && *start_time == at(15, 0))
            .returning(|_, _| Ok(Some(7)));

        let decision = ConflictChecker::new(&store)
            .check(&BookingRequest::new(1, 2, at(15, 0)))
            .await
            .unwrap();

        assert_eq!(
            decision,
            Decision::Rejected(RejectionReason::ArtistAlreadyBooked)
        );
    }

    #[tokio::test]
    async fn test_storage_fault_propagates() {
        let mut store = MockBookingStore::new();
        store
            .expect_get_artist()
            .returning(|_| Err(DbErr::Custom("connection lost".into())));

        let result = ConflictChecker::new(&store)
            .check(&BookingRequest::new(1, 1, at(15, 0)))
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_request_truncates_subseconds() {
        let precise = Utc
            .timestamp_opt(at(15, 0).timestamp(), 250_000_000)
            .unwrap();
        let request = BookingRequest::new(1, 1, precise);
        assert_eq!(request.start_time, at(15, 0));
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectionReason::ArtistUnavailable.code(), "ARTIST_UNAVAILABLE");
        assert_eq!(
            RejectionReason::ArtistAlreadyBooked.code(),
            "ARTIST_ALREADY_BOOKED"
        );
        assert_eq!(RejectionReason::InvalidReference.code(), "INVALID_REFERENCE");
        let persistence = RejectionReason::Persistence("disk I/O error".into());
        assert_eq!(persistence.code(), "PERSISTENCE_ERROR");
        assert!(!persistence.to_string().contains("disk I/O error"));
    }
}
