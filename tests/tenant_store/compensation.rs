//! Compensation Tests
//!
//! Tests for store failures in the middle of an operation:
//! - Rejected commits undo claims made before them
//! - Commits whose acknowledgement was lost count as applied
//! - Claims whose acknowledgement was lost are undone
//! - Failed releases after a committed removal are tolerated

use crate::*;

// =============================================================================
// ADD
// =============================================================================

#[test]
fn test_rejected_commit_on_add() {
    for_each_strategy(|strategy, tenantry| {
        tenantry
            .database()
            .faults()
            .fail_next(Operation::Commit, FaultMode::Reject, 1);

        let mut store = tenantry.tenant_store();
        let mut record = TenantRecord::new("t/1", "acme", "Acme");
        let err = store.try_add(&mut record).unwrap_err();
        assert!(err.is_unavailable(), "{:?}: {}", strategy, err);

        assert!(reservation_owner(tenantry, "acme").is_none());
        assert!(stored_tenant(tenantry, "t/1").is_none());

        // Retry once the store is back
        assert!(store.try_add(&mut record).unwrap());
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_lost_commit_acknowledgement_on_add() {
    for_each_strategy(|_, tenantry| {
        tenantry
            .database()
            .faults()
            .fail_next(Operation::Commit, FaultMode::AckLost, 1);

        let mut record = TenantRecord::new("t/1", "acme", "Acme");
        assert!(tenantry.tenant_store().try_add(&mut record).unwrap());

        assert_eq!(reservation_owner(tenantry, "acme").as_deref(), Some("t/1"));
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_lost_claim_acknowledgement_is_undone() {
    let tenantry = Strategy::DirectValue.open();
    tenantry
        .database()
        .faults()
        .fail_next(Operation::CompareExchangePut, FaultMode::AckLost, 1);

    let mut record = TenantRecord::new("t/1", "acme", "Acme");
    let err = tenantry.tenant_store().try_add(&mut record).unwrap_err();
    assert!(err.is_unavailable());

    assert!(reservation_owner(&tenantry, "acme").is_none());
    assert!(stored_tenant(&tenantry, "t/1").is_none());
}

#[test]
fn test_unreachable_store_before_claim() {
    let tenantry = Strategy::DirectValue.open();
    tenantry
        .database()
        .faults()
        .fail_next(Operation::CompareExchangeGet, FaultMode::Reject, 1);

    let mut record = TenantRecord::new("t/1", "acme", "Acme");
    assert!(tenantry.tenant_store().try_add(&mut record).is_err());
    assert_eq!(tenantry.metrics().reservations, 0);
    assert_eq!(tenantry.metrics().tenants, 0);
}

// =============================================================================
// UPDATE
// =============================================================================

#[test]
fn test_rejected_commit_on_rename() {
    for_each_strategy(|strategy, tenantry| {
        seed(tenantry, "t/1", "old");

        let mut store = tenantry.tenant_store();
        let mut record = store.try_get("t/1").unwrap().unwrap();
        record.identifier = "new".into();
        tenantry
            .database()
            .faults()
            .fail_next(Operation::Commit, FaultMode::Reject, 1);
        assert!(store.try_update(&mut record).is_err(), "{:?}", strategy);

        assert_eq!(reservation_owner(tenantry, "old").as_deref(), Some("t/1"));
        assert!(reservation_owner(tenantry, "new").is_none());
        assert_eq!(stored_tenant(tenantry, "t/1").unwrap().identifier, "old");
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_lost_commit_acknowledgement_on_rename() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "old");

        let mut store = tenantry.tenant_store();
        let mut record = store.try_get("t/1").unwrap().unwrap();
        record.identifier = "new".into();
        tenantry
            .database()
            .faults()
            .fail_next(Operation::Commit, FaultMode::AckLost, 1);
        assert!(store.try_update(&mut record).unwrap());

        assert!(reservation_owner(tenantry, "old").is_none());
        assert_eq!(reservation_owner(tenantry, "new").as_deref(), Some("t/1"));
        assert_reservations_match_records(tenantry);
    });
}

// =============================================================================
// REMOVE
// =============================================================================

#[test]
fn test_rejected_commit_on_remove() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");
        tenantry
            .database()
            .faults()
            .fail_next(Operation::Commit, FaultMode::Reject, 1);

        let err = tenantry.tenant_store().try_remove("t/1").unwrap_err();
        assert!(err.is_retryable());

        assert!(stored_tenant(tenantry, "t/1").is_some());
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_lost_commit_acknowledgement_on_remove() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");
        tenantry
            .database()
            .faults()
            .fail_next(Operation::Commit, FaultMode::AckLost, 1);

        assert!(tenantry.tenant_store().try_remove("t/1").unwrap());
        assert!(stored_tenant(tenantry, "t/1").is_none());
        assert!(reservation_owner(tenantry, "acme").is_none());
    });
}

#[test]
fn test_failed_release_after_remove_keeps_removal() {
    let tenantry = Strategy::DirectValue.open();
    seed(&tenantry, "t/1", "acme");
    tenantry
        .database()
        .faults()
        .fail_next(Operation::CompareExchangeDelete, FaultMode::Reject, 1);

    assert!(tenantry.tenant_store().try_remove("t/1").unwrap());
    assert!(stored_tenant(&tenantry, "t/1").is_none());

    // Left for an out-of-band sweep; release is idempotent
    assert_eq!(reservation_owner(&tenantry, "acme").as_deref(), Some("t/1"));
    let guard = tenantry.options().guard();
    let mut session = tenantry.database().open_session();
    for _ in 0..2 {
        assert!(guard
            .release(&mut session, ReservationType::Identifier, "acme")
            .unwrap());
    }
    assert!(reservation_owner(&tenantry, "acme").is_none());
}
