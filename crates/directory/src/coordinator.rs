//! Tenant record coordinator
//!
//! Ties every identifier reservation to the lifecycle of the record that
//! owns it. Each operation is one request-scoped sequence of store calls
//! on the caller's session:
//!
//! ```text
//! create: validate -> normalize -> is_taken -> stage record -> claim -> commit
//! update: loaded? -> stage record -> detect change -> move -> commit -> release old
//! delete: load -> release (staged or after commit) -> stage delete -> commit
//! ```
//!
//! A claim that is durable before the commit (direct-value strategy) is
//! compensated when the commit fails, so no reservation is ever left
//! without its owner. Every failed operation discards the session's
//! pending changes.
//!
//! When a commit reports a connectivity failure the record is read back
//! to find out whether the write landed anyway. If it did, the operation
//! completes as a success; if that read fails too, reservations are left
//! in place for an out-of-band sweep rather than risk a record without
//! its reservation.

use crate::options::ReservationOptions;
use std::sync::Arc;
use tenantry_concurrency::{Expected, Session};
use tenantry_core::{
    normalize_unique_value, Document, Error, Outcome, ReservationType, Result, TenantRecord,
};
use tenantry_reservation::{detect_change, Claim, UniquenessGuard};

const IDENTIFIER: ReservationType = ReservationType::Identifier;

/// What a failed commit left behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitResolution {
    /// The write is in the store despite the error
    Applied,
    /// Nothing was written
    NotApplied,
    /// The store could not be asked
    Unknown,
}

/// Create, update and delete tenant records together with their reservations
#[derive(Debug, Clone)]
pub struct TenantRecordCoordinator {
    guard: Arc<dyn UniquenessGuard>,
}

impl TenantRecordCoordinator {
    /// Coordinator over an explicit guard
    pub fn new(guard: Arc<dyn UniquenessGuard>) -> Self {
        Self { guard }
    }

    /// Coordinator using the strategy selected by `options`
    pub fn from_options(options: &ReservationOptions) -> Self {
        Self::new(options.guard())
    }

    /// The reservation guard in use
    pub fn guard(&self) -> &dyn UniquenessGuard {
        self.guard.as_ref()
    }

    /// Add a new record and reserve its identifier
    ///
    /// Assigns an id when `record.id` is empty.
    pub fn create(&self, session: &mut Session, record: &mut TenantRecord) -> Result<Outcome> {
        record.validate()?;
        self.guard.prepare(session);
        let result = self.try_create(session, record);
        finish(session, "create", &record.id, result)
    }

    fn try_create(&self, session: &mut Session, record: &mut TenantRecord) -> Result<Outcome> {
        let normalized = record.normalized_identifier();
        if self.guard.is_taken(session, IDENTIFIER, &normalized)? {
            tracing::info!(identifier = %record.identifier, "tenant identifier not unique");
            return Ok(Outcome::NotUnique);
        }

        session.store_with(record, Expected::Absent)?;
        let owner = record.id.clone();

        let claimed = match self.guard.claim(session, IDENTIFIER, &normalized, &owner) {
            Ok(Claim::Claimed { revision }) => revision,
            Ok(Claim::AlreadyTaken) => {
                tracing::info!(identifier = %record.identifier, "tenant identifier claimed concurrently");
                return Ok(Outcome::NotUnique);
            }
            Err(e) => {
                // The claim may have landed even though the call failed.
                self.compensate(session, &normalized, &owner, None);
                return Err(e);
            }
        };

        match session.save_changes() {
            Ok(receipt) => {
                tracing::debug!(id = %owner, identifier = %normalized, version = receipt.version, "tenant created");
                Ok(Outcome::Success)
            }
            Err(e) => match resolve_failed_commit(session, &owner, &e, |stored| stored.is_some()) {
                CommitResolution::Applied => Ok(acknowledgement_lost(session, "create", &owner)),
                CommitResolution::NotApplied => {
                    self.compensate(session, &normalized, &owner, claimed);
                    commit_failure("create", &owner, e)
                }
                CommitResolution::Unknown => Err(e),
            },
        }
    }

    /// Persist changes to a record loaded in `session`, moving its
    /// reservation when the identifier changed
    pub fn update(&self, session: &mut Session, record: &mut TenantRecord) -> Result<Outcome> {
        record.validate()?;
        if record.id.trim().is_empty() {
            return Err(Error::invalid_input("tenant id must not be empty"));
        }
        if !session.is_loaded(&record.id) {
            return Err(Error::NotLoaded {
                id: record.id.clone(),
            });
        }
        self.guard.prepare(session);
        let result = self.try_update(session, record);
        finish(session, "update", &record.id, result)
    }

    fn try_update(&self, session: &mut Session, record: &mut TenantRecord) -> Result<Outcome> {
        // A value staged earlier in this session must agree with the record.
        detect_change(
            &session.what_changed(),
            &record.id,
            TenantRecord::IDENTIFIER_FIELD,
            &record.identifier,
        )?;

        session.store(record)?;
        let change = detect_change(
            &session.what_changed(),
            &record.id,
            TenantRecord::IDENTIFIER_FIELD,
            &record.identifier,
        )?
        .map(|change| change.map(|value| normalize_unique_value(&value)))
        .filter(|change| !change.is_noop());

        let mut claimed = None;
        if let Some(change) = &change {
            match self.guard.move_reservation(
                session,
                IDENTIFIER,
                &change.old_value,
                &change.new_value,
                &record.id,
            ) {
                Ok(Claim::Claimed { revision }) => claimed = revision,
                Ok(Claim::AlreadyTaken) => {
                    tracing::info!(identifier = %record.identifier, "tenant identifier not unique");
                    return Ok(Outcome::NotUnique);
                }
                Err(e) => {
                    self.compensate(session, &change.new_value, &record.id, None);
                    return Err(e);
                }
            }
        }

        let committed = match session.save_changes() {
            Ok(receipt) => {
                tracing::debug!(id = %record.id, moved = change.is_some(), version = receipt.version, "tenant updated");
                Ok(Outcome::Success)
            }
            Err(e) => {
                let written = record.clone();
                let resolution =
                    resolve_failed_commit(session, &record.id, &e, |stored| stored == Some(written));
                match resolution {
                    CommitResolution::Applied => Ok(acknowledgement_lost(session, "update", &record.id)),
                    CommitResolution::NotApplied => {
                        if let Some(change) = &change {
                            self.compensate(session, &change.new_value, &record.id, claimed);
                        }
                        commit_failure("update", &record.id, e)
                    }
                    CommitResolution::Unknown => Err(e),
                }
            }
        };

        if let (Ok(Outcome::Success), Some(change)) = (&committed, &change) {
            self.release_after_commit(session, &change.old_value, &record.id);
        }
        committed
    }

    /// Remove a record and its reservation
    ///
    /// Returns [`Outcome::NotFound`] when no record has `id`.
    pub fn delete(&self, session: &mut Session, id: &str) -> Result<Outcome> {
        if id.trim().is_empty() {
            return Err(Error::invalid_input("tenant id must not be empty"));
        }
        self.guard.prepare(session);
        let record = match session.load::<TenantRecord>(id)? {
            Some(record) => record,
            None => {
                tracing::warn!(id, "tenant to remove not found");
                return Ok(Outcome::NotFound);
            }
        };
        let result = self.try_delete(session, &record);
        finish(session, "delete", id, result)
    }

    fn try_delete(&self, session: &mut Session, record: &TenantRecord) -> Result<Outcome> {
        let normalized = record.normalized_identifier();
        if self.guard.stages_in_unit_of_work() {
            self.guard.release(session, IDENTIFIER, &normalized)?;
        }
        session.delete::<TenantRecord>(&record.id)?;

        let committed = match session.save_changes() {
            Ok(_) => {
                tracing::debug!(id = %record.id, identifier = %normalized, "tenant removed");
                Ok(Outcome::Success)
            }
            Err(e) => match resolve_failed_commit(session, &record.id, &e, |stored| stored.is_none()) {
                CommitResolution::Applied => Ok(acknowledgement_lost(session, "delete", &record.id)),
                CommitResolution::NotApplied => commit_failure("delete", &record.id, e),
                CommitResolution::Unknown => Err(e),
            },
        };

        if matches!(committed, Ok(Outcome::Success)) {
            self.release_after_commit(session, &normalized, &record.id);
        }
        committed
    }

    /// Undo a claim of `owner_id` that may have become durable
    ///
    /// `revision` is what the claim wrote, when it reported back. Without
    /// it only the owner id is checked.
    fn compensate(&self, session: &mut Session, normalized: &str, owner_id: &str, revision: Option<u64>) {
        if self.guard.stages_in_unit_of_work() {
            return;
        }
        match self
            .guard
            .release_claim(session, IDENTIFIER, normalized, owner_id, revision)
        {
            Ok(true) => {
                tracing::debug!(identifier = normalized, owner = owner_id, "claim compensated")
            }
            Ok(false) => tracing::error!(
                identifier = normalized,
                owner = owner_id,
                "claim compensation gave up, reservation may be orphaned"
            ),
            Err(e) => tracing::error!(
                identifier = normalized,
                owner = owner_id,
                error = %e,
                "claim compensation failed, reservation may be orphaned"
            ),
        }
    }

    /// Release a reservation its owner stopped using in a committed write
    ///
    /// Staged releases were part of the commit. Failures are logged; the
    /// owner's write already committed.
    fn release_after_commit(&self, session: &mut Session, normalized: &str, owner_id: &str) {
        if self.guard.stages_in_unit_of_work() {
            return;
        }
        match self
            .guard
            .release_owned(session, IDENTIFIER, normalized, owner_id)
        {
            Ok(true) => {}
            Ok(false) => tracing::error!(identifier = normalized, "stale reservation not released"),
            Err(e) => tracing::error!(
                identifier = normalized,
                error = %e,
                "stale reservation not released"
            ),
        }
    }
}

/// Discard pending changes unless the operation succeeded
fn finish(session: &mut Session, operation: &'static str, id: &str, result: Result<Outcome>) -> Result<Outcome> {
    if !matches!(result, Ok(Outcome::Success)) {
        session.discard_pending();
        tracing::trace!(operation, id, "pending changes discarded");
    }
    result
}

/// Decide whether a failed commit was applied
///
/// Only connectivity failures are ambiguous. `applied` receives the record
/// as currently stored (read without tracking).
fn resolve_failed_commit(
    session: &Session,
    id: &str,
    error: &Error,
    applied: impl FnOnce(Option<TenantRecord>) -> bool,
) -> CommitResolution {
    if !error.is_unavailable() {
        return CommitResolution::NotApplied;
    }
    let stored = session
        .database()
        .load_document(TenantRecord::COLLECTION, id)
        .and_then(|loaded| match loaded {
            Some(loaded) => Ok(Some(serde_json::from_value::<TenantRecord>(loaded.document.body)?)),
            None => Ok(None),
        });
    match stored {
        Ok(stored) => {
            if applied(stored) {
                CommitResolution::Applied
            } else {
                CommitResolution::NotApplied
            }
        }
        Err(lookup) => {
            tracing::error!(
                id,
                error = %error,
                lookup_error = %lookup,
                "commit outcome unknown, reservations kept for reconciliation"
            );
            CommitResolution::Unknown
        }
    }
}

/// The session still holds the commit as pending, so its snapshots are
/// dropped and later reads go back to the store.
fn acknowledgement_lost(session: &mut Session, operation: &'static str, id: &str) -> Outcome {
    tracing::warn!(operation, id, "commit acknowledgement lost, write found in store");
    session.clear();
    Outcome::Success
}

fn commit_failure(operation: &'static str, id: &str, error: Error) -> Result<Outcome> {
    tracing::error!(operation, id, error = %error, "tenant commit failed");
    if error.is_conflict() {
        Ok(Outcome::Conflict)
    } else {
        Err(error)
    }
}
