use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbErr, SqlErr, TransactionTrait};

use crate::database::Database;
use crate::ports::booking_store::{BookingStore, NewShow};
use crate::services::conflict::{BookingRequest, ConflictChecker, Decision, RejectionReason};
use crate::store::EntityStore;

/// Writes shows. Every booking runs the conflict check and the insert in one
/// transaction and either commits exactly one row or nothing.
pub struct BookingService {
    db: Arc<Database>,
}

impl BookingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Book `artist_id` at `venue_id` starting at `start_time`.
    pub async fn create_show(
        &self,
        artist_id: i64,
        venue_id: i64,
        start_time: DateTime<Utc>,
    ) -> Result<i64, RejectionReason> {
        self.book(BookingRequest::new(artist_id, venue_id, start_time), None)
            .await
    }

    /// Book a request with an optional show name. Returns the new show id.
    ///
    /// Rejections are returned unchanged from the conflict checker. Storage
    /// failures roll back and come back as [`RejectionReason::Persistence`],
    /// except a clash on the (artist, start time) key, which means a
    /// concurrent booking won the slot.
    pub async fn book(
        &self,
        request: BookingRequest,
        name: Option<String>,
    ) -> Result<i64, RejectionReason> {
        log::debug!(
            "Booking artist {} at venue {} for {}",
            request.artist_id,
            request.venue_id,
            request.start_time
        );

        let txn = self
            .db
            .conn
            .begin()
            .await
            .map_err(|e| storage_failure("begin booking transaction", e))?;

        match Self::check_and_insert(&txn, &request, name).await {
            Ok(show_id) => {
                txn.commit()
                    .await
                    .map_err(|e| storage_failure("commit booking", e))?;
                log::info!(
                    "Show {} booked: artist {} at venue {} for {}",
                    show_id,
                    request.artist_id,
                    request.venue_id,
                    request.start_time
                );
                Ok(show_id)
            }
            Err(reason) => {
                if let Err(e) = txn.rollback().await {
                    log::error!("Failed to roll back booking transaction: {}", e);
                }
                if !matches!(reason, RejectionReason::Persistence(_)) {
                    log::warn!(
                        "Booking rejected ({}): artist {} at venue {} for {}",
                        reason.code(),
                        request.artist_id,
                        request.venue_id,
                        request.start_time
                    );
                }
                Err(reason)
            }
        }
    }

    async fn check_and_insert<C>(
        conn: &C,
        request: &BookingRequest,
        name: Option<String>,
    ) -> Result<i64, RejectionReason>
    where
        C: ConnectionTrait + Sync,
    {
        let store = EntityStore::new(conn);

        let decision = ConflictChecker::new(&store)
            .check(request)
            .await
            .map_err(|e| storage_failure("run conflict check", e))?;
        if let Decision::Rejected(reason) = decision {
            return Err(reason);
        }

        store
            .insert_show(NewShow {
                artist_id: request.artist_id,
                venue_id: request.venue_id,
                start_time: request.start_time,
                name,
            })
            .await
            .map_err(classify_insert_error)
    }
}

/// A uniqueness clash on insert means another booking for the same artist and
/// instant committed after our check ran.
fn classify_insert_error(err: DbErr) -> RejectionReason {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        log::warn!("Booking lost a race for the same artist and start time: {}", err);
        return RejectionReason::ArtistAlreadyBooked;
    }
    storage_failure("insert show", err)
}

fn storage_failure(action: &str, err: DbErr) -> RejectionReason {
    log::error!("Database error creating show (failed to {}): {}", action, err);
    RejectionReason::Persistence(err.to_string())
}
