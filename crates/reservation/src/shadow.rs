//! Shadow-document strategy
//!
//! Each reservation is a small document whose id encodes the reserved
//! value and whose `referenceId` points at the owner. Reservation writes
//! are staged in the caller's session and committed together with the
//! owner's write in one cluster-wide transaction, so the atomic guard of
//! the reservation document rejects duplicates and no compensation is
//! ever needed.

use crate::guard::{Claim, UniquenessGuard};
use crate::keys::{reservation_document_id, RESERVATION_COLLECTION};
use serde::{Deserialize, Serialize};
use tenantry_concurrency::{Session, TransactionMode};
use tenantry_core::{Document, Error, ReservationType, Result};

/// Shadow reservation document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueReservation {
    /// Deterministic id built from the reserved value
    pub id: String,
    /// Id of the owning record
    pub reference_id: String,
}

impl UniqueReservation {
    /// Create a reservation document
    pub fn new(id: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference_id: reference_id.into(),
        }
    }
}

impl Document for UniqueReservation {
    const COLLECTION: &'static str = RESERVATION_COLLECTION;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Reservations stored as documents protected by atomic guards
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowDocumentGuard;

impl ShadowDocumentGuard {
    /// Create the guard
    pub fn new() -> Self {
        Self
    }

    fn document_id(session: &Session, reservation_type: ReservationType, value: &str) -> String {
        reservation_document_id(session.database().conventions(), reservation_type, value)
    }

    fn require_cluster_wide(session: &Session) -> Result<()> {
        if session.transaction_mode() != TransactionMode::ClusterWide {
            return Err(Error::ClusterWideModeRequired);
        }
        Ok(())
    }

    fn stage_new(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        value: &str,
        owner_id: &str,
    ) -> Result<Claim> {
        if owner_id.is_empty() {
            return Err(Error::invalid_input("reservation owner id must not be empty"));
        }
        let id = Self::document_id(session, reservation_type, value);
        if session.is_new(&id) {
            return Err(Error::ReservationAlreadyStaged { id });
        }
        if session.exists(RESERVATION_COLLECTION, &id)? {
            return Ok(Claim::AlreadyTaken);
        }
        // The store no longer has it, so any tracked copy is a stale read.
        if session.is_loaded(&id) {
            tracing::debug!(reservation = %id, "dropping stale reservation snapshot");
        }
        session.evict(&id);
        let mut reservation = UniqueReservation::new(id, owner_id);
        session.store(&mut reservation)?;
        tracing::debug!(reservation = %reservation.id, owner = owner_id, "reservation staged");
        Ok(Claim::Claimed { revision: None })
    }

    fn stage_delete(&self, session: &mut Session, id: &str) -> Result<()> {
        match session.load::<UniqueReservation>(id)? {
            Some(_) => session.delete::<UniqueReservation>(id),
            None => {
                tracing::warn!(reservation = id, "reservation document unexpectedly missing");
                Ok(())
            }
        }
    }
}

impl UniquenessGuard for ShadowDocumentGuard {
    fn name(&self) -> &'static str {
        "shadow-document"
    }

    fn prepare(&self, session: &mut Session) {
        session.set_transaction_mode(TransactionMode::ClusterWide);
        session.set_use_optimistic_concurrency(false);
    }

    fn stages_in_unit_of_work(&self) -> bool {
        true
    }

    fn is_taken(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<bool> {
        let id = Self::document_id(session, reservation_type, normalized_value);
        session.exists(RESERVATION_COLLECTION, &id)
    }

    fn claim(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
    ) -> Result<Claim> {
        Self::require_cluster_wide(session)?;
        self.stage_new(session, reservation_type, normalized_value, owner_id)
    }

    fn move_reservation(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        old_value: &str,
        new_value: &str,
        owner_id: &str,
    ) -> Result<Claim> {
        Self::require_cluster_wide(session)?;
        if old_value == new_value {
            return Ok(Claim::Claimed { revision: None });
        }
        let new_id = Self::document_id(session, reservation_type, new_value);
        if session.is_new(&new_id) {
            return Err(Error::ReservationAlreadyStaged { id: new_id });
        }
        if session.exists(RESERVATION_COLLECTION, &new_id)? {
            return Ok(Claim::AlreadyTaken);
        }
        let old_id = Self::document_id(session, reservation_type, old_value);
        self.stage_delete(session, &old_id)?;
        self.stage_new(session, reservation_type, new_value, owner_id)
    }

    fn release(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<bool> {
        Self::require_cluster_wide(session)?;
        let id = Self::document_id(session, reservation_type, normalized_value);
        self.stage_delete(session, &id)?;
        Ok(true)
    }

    fn release_owned(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
    ) -> Result<bool> {
        // Staged claims never reached the store; unstaging is enough.
        let id = Self::document_id(session, reservation_type, normalized_value);
        if session.is_new(&id) {
            let ours = session
                .load::<UniqueReservation>(&id)?
                .map(|r| r.reference_id == owner_id)
                .unwrap_or(false);
            if ours {
                session.delete::<UniqueReservation>(&id)?;
            }
        }
        Ok(true)
    }

    fn owner_of(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<Option<String>> {
        let id = Self::document_id(session, reservation_type, normalized_value);
        Ok(session
            .load::<UniqueReservation>(&id)?
            .map(|reservation| reservation.reference_id))
    }
}
