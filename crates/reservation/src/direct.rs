//! Direct-value strategy
//!
//! Each reservation is a raw compare-exchange key whose payload is the
//! owner's record id. Claims and releases hit the store immediately and do
//! not take part in the session's commit, so a failed commit must be
//! compensated with [`UniquenessGuard::release_claim`], which removes only
//! the revision that claim wrote.

use crate::cas_keys::CasKeyStore;
use crate::guard::{Claim, UniquenessGuard};
use crate::keys::compare_exchange_key;
use tenantry_concurrency::{Session, TransactionMode};
use tenantry_core::{ReservationType, Result};

/// Attempts before giving up on a delete racing with other writers
const MAX_DELETE_ATTEMPTS: usize = 3;

/// Reservations stored as compare-exchange keys
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectValueGuard;

impl DirectValueGuard {
    /// Create the guard
    pub fn new() -> Self {
        Self
    }

    fn cas(session: &Session) -> CasKeyStore {
        CasKeyStore::new(session.database().clone())
    }

    /// Delete `key` if `owner_id` is `None` or holds it
    fn delete_key(cas: &CasKeyStore, key: &str, owner_id: Option<&str>) -> Result<bool> {
        for _ in 0..MAX_DELETE_ATTEMPTS {
            let entry = match cas.get(key)? {
                Some(entry) => entry,
                None => return Ok(true),
            };
            if let Some(owner) = owner_id {
                if entry.value != owner {
                    tracing::debug!(key, holder = %entry.value, "reservation held by another owner, left in place");
                    return Ok(true);
                }
            }
            if cas.delete(key, entry.revision)? {
                tracing::debug!(key, "reservation released");
                return Ok(true);
            }
        }
        tracing::warn!(key, attempts = MAX_DELETE_ATTEMPTS, "reservation kept changing during release");
        Ok(false)
    }
}

impl UniquenessGuard for DirectValueGuard {
    fn name(&self) -> &'static str {
        "direct-value"
    }

    fn prepare(&self, session: &mut Session) {
        session.set_transaction_mode(TransactionMode::SingleNode);
        session.set_use_optimistic_concurrency(true);
    }

    fn stages_in_unit_of_work(&self) -> bool {
        false
    }

    fn is_taken(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<bool> {
        let key = compare_exchange_key(reservation_type, normalized_value);
        Ok(Self::cas(session).get(&key)?.is_some())
    }

    fn claim(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
    ) -> Result<Claim> {
        let key = compare_exchange_key(reservation_type, normalized_value);
        match Self::cas(session).create(&key, owner_id)? {
            Some(revision) => {
                tracing::debug!(key = %key, owner = owner_id, revision, "reservation claimed");
                Ok(Claim::Claimed {
                    revision: Some(revision),
                })
            }
            None => Ok(Claim::AlreadyTaken),
        }
    }

    fn move_reservation(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        old_value: &str,
        new_value: &str,
        owner_id: &str,
    ) -> Result<Claim> {
        if old_value == new_value {
            return Ok(Claim::Claimed { revision: None });
        }
        // The old key is released by the caller once the owner's write
        // has committed.
        self.claim(session, reservation_type, new_value, owner_id)
    }

    fn release(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<bool> {
        let key = compare_exchange_key(reservation_type, normalized_value);
        Self::delete_key(&Self::cas(session), &key, None)
    }

    fn release_owned(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
    ) -> Result<bool> {
        let key = compare_exchange_key(reservation_type, normalized_value);
        Self::delete_key(&Self::cas(session), &key, Some(owner_id))
    }

    fn release_claim(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
        owner_id: &str,
        revision: Option<u64>,
    ) -> Result<bool> {
        let revision = match revision {
            Some(revision) => revision,
            None => return self.release_owned(session, reservation_type, normalized_value, owner_id),
        };
        let key = compare_exchange_key(reservation_type, normalized_value);
        if Self::cas(session).delete(&key, revision)? {
            tracing::debug!(key = %key, revision, "claim released");
        } else {
            tracing::debug!(key = %key, revision, "reservation rewritten since claim, left in place");
        }
        Ok(true)
    }

    fn owner_of(
        &self,
        session: &mut Session,
        reservation_type: ReservationType,
        normalized_value: &str,
    ) -> Result<Option<String>> {
        let key = compare_exchange_key(reservation_type, normalized_value);
        Ok(Self::cas(session).get(&key)?.map(|entry| entry.value))
    }
}
