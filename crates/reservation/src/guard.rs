//! The uniqueness guard contract
//!
//! A guard answers "is this normalized value free?" and claims, moves or
//! releases reservations. The active unit of work is passed to every call;
//! guards hold no per-request state, so one instance serves all sessions.
//!
//! Strategies differ in *when* their effects become durable:
//!
//! | Strategy | claim / move / release |
//! |----------|------------------------|
//! | direct value | immediately, independent of the session's commit |
//! | shadow document | staged, applied by the session's commit |
//!
//! Callers consult [`UniquenessGuard::stages_in_unit_of_work`] to decide
//! whether a claim needs compensation when the commit fails.

use tenantry_concurrency::Session;
use tenantry_core::{ReservationType, Result};

/// Result of trying to take a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The reservation is ours (durable or staged, depending on strategy)
    Claimed {
        /// Revision written by a durable claim
        revision: Option<u64>,
    },
    /// Another owner holds the value
    AlreadyTaken,
}

impl Claim {
    /// Whether the value was claimed
    pub fn is_claimed(&self) -> bool {
        matches!(self, Claim::Claimed { .. })
    }
}

/// Reservation protocol over one physical encoding
pub trait UniquenessGuard: Send + Sync + std::fmt::Debug {
    /// Strategy name (for logs)
    fn name(&self) -> &'static str;

    /// Put the session in the transaction mode this strategy relies on
    fn prepare(&self, session: &mut Session);

    /// Whether reservation changes are applied by the session's commit
    fn stages_in_unit_of_work(&self) -> bool;

    /// Whether `normalized_value` is currently reserved
    ///
    /// An early, cheap rejection only. Uniqueness is enforced by
    /// [`UniquenessGuard::claim`].
    fn is_taken(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<bool>;

    /// Reserve `normalized_value` for `owner_id`
    fn claim(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
    ) -> Result<Claim>;

    /// Move `owner_id`'s reservation from `old_value` to `new_value`
    ///
    /// Only `new_value` is checked. When it is taken nothing changes and
    /// the old reservation stays in place.
    fn move_reservation(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        old_value: &str,
        new_value: &str,
        owner_id: &str,
    ) -> Result<Claim>;

    /// Release `normalized_value` regardless of its owner
    ///
    /// Idempotent: releasing a value that is not reserved succeeds.
    fn release(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<bool>;

    /// Undo a claim made for `owner_id`
    ///
    /// Leaves another owner's reservation untouched, so a claim that lost
    /// a race never removes the winner's reservation. Returns `true` when
    /// no reservation of `owner_id` remains for the value.
    fn release_owned(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
    ) -> Result<bool>;

    /// Undo the claim that wrote `revision`
    ///
    /// A reservation rewritten since that claim stays, even when it names
    /// the same owner. Without a revision this is
    /// [`UniquenessGuard::release_owned`].
    fn release_claim(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
        _revision: Option<u64>,
    ) -> Result<bool> {
        self.release_owned(session, reservation_type, normalized_value, owner_id)
    }

    /// Id of the record holding `normalized_value`
    fn owner_of(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<Option<String>>;
}
