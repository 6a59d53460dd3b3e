//! Remove Tests
//!
//! Tests for removing tenants:
//! - The reservation goes with the record
//! - Missing tenants and empty ids

use crate::*;

#[test]
fn test_remove_releases_reservation() {
    for_each_strategy(|strategy, tenantry| {
        seed(tenantry, "t/1", "acme");
        seed(tenantry, "t/2", "contoso");

        let mut store = tenantry.tenant_store();
        assert!(store.try_remove("t/1").unwrap(), "{:?}: remove should succeed", strategy);

        assert!(stored_tenant(tenantry, "t/1").is_none());
        assert!(reservation_owner(tenantry, "acme").is_none());
        assert_eq!(reservation_owner(tenantry, "contoso").as_deref(), Some("t/2"));
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_identifier_reusable_after_remove() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");
        assert!(tenantry.tenant_store().try_remove("t/1").unwrap());

        seed(tenantry, "t/2", "ACME");
        assert_eq!(reservation_owner(tenantry, "acme").as_deref(), Some("t/2"));
    });
}

#[test]
fn test_remove_missing_tenant() {
    for_each_strategy(|_, tenantry| {
        let mut store = tenantry.tenant_store();
        assert_eq!(store.remove("t/404").unwrap(), Outcome::NotFound);
        assert!(!store.try_remove("t/404").unwrap());
    });
}

#[test]
fn test_remove_twice() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");

        let mut store = tenantry.tenant_store();
        assert!(store.try_remove("t/1").unwrap());
        assert!(!store.try_remove("t/1").unwrap());
        assert!(!tenantry.tenant_store().try_remove("t/1").unwrap());
    });
}

#[test]
fn test_remove_requires_id() {
    for_each_strategy(|_, tenantry| {
        let err = tenantry.tenant_store().try_remove("  ").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    });
}

#[test]
fn test_remove_after_rename_releases_new_identifier() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "before");

        let mut store = tenantry.tenant_store();
        let mut record = store.try_get("t/1").unwrap().unwrap();
        record.identifier = "after".into();
        assert!(store.try_update(&mut record).unwrap());
        assert!(store.try_remove("t/1").unwrap());

        assert!(reservation_owner(tenantry, "before").is_none());
        assert!(reservation_owner(tenantry, "after").is_none());
        assert_eq!(tenantry.metrics().reservations, 0);
    });
}
