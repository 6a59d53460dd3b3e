//! Create Tests
//!
//! Tests for adding tenants:
//! - Identifier reservation on add
//! - Duplicates across case and Unicode forms
//! - Required fields and id assignment

use crate::*;

// =============================================================================
// RESERVATION ON ADD
// =============================================================================

#[test]
fn test_add_reserves_identifier() {
    for_each_strategy(|strategy, tenantry| {
        let mut store = tenantry.tenant_store();
        let mut record = TenantRecord::new("id123", "tenant-a", "Tenant A");
        assert!(store.try_add(&mut record).unwrap(), "{:?}: add should succeed", strategy);

        assert_eq!(reservation_owner(tenantry, "tenant-a").as_deref(), Some("id123"));
        assert_eq!(stored_tenant(tenantry, "id123"), Some(record));
    });
}

#[test]
fn test_add_duplicate_identifier_is_refused() {
    for_each_strategy(|strategy, tenantry| {
        seed(tenantry, "id123", "tenant-a");

        let mut store = tenantry.tenant_store();
        let mut duplicate = TenantRecord::new("id987", "tenant-a", "X");
        assert!(
            !store.try_add(&mut duplicate).unwrap(),
            "{:?}: duplicate should be refused",
            strategy
        );

        assert!(stored_tenant(tenantry, "id987").is_none());
        assert_eq!(reservation_owner(tenantry, "tenant-a").as_deref(), Some("id123"));
        assert_eq!(tenantry.metrics().reservations, 1);
    });
}

#[test]
fn test_duplicate_differs_only_in_case() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "Contoso");

        let mut store = tenantry.tenant_store();
        let outcome = store
            .add(&mut TenantRecord::new("t/2", "CONTOSO", "Other"))
            .unwrap();
        assert_eq!(outcome, Outcome::NotUnique);
    });
}

#[test]
fn test_duplicate_differs_only_in_unicode_form() {
    for_each_strategy(|_, tenantry| {
        let composed = "Caf\u{e9}";
        let decomposed = "Cafe\u{301}";
        seed(tenantry, "t/1", composed);

        let mut store = tenantry.tenant_store();
        let mut other = TenantRecord::new("t/2", decomposed, "Other");
        assert!(!store.try_add(&mut other).unwrap());
        assert_eq!(reservation_owner(tenantry, decomposed).as_deref(), Some("t/1"));
    });
}

#[test]
fn test_store_usable_after_refused_add() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "taken");

        let mut store = tenantry.tenant_store();
        assert!(!store
            .try_add(&mut TenantRecord::new("t/2", "taken", "Refused"))
            .unwrap());
        assert!(!store.session().has_changes());

        assert!(store
            .try_add(&mut TenantRecord::new("t/2", "free", "Accepted"))
            .unwrap());
        assert_eq!(stored_tenant(tenantry, "t/2").unwrap().identifier, "free");
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_add_many_in_one_store() {
    for_each_strategy(|_, tenantry| {
        let mut store = tenantry.tenant_store();
        for i in 0..5 {
            let mut record = TenantRecord::new("", format!("tenant-{}", i), "Tenant");
            assert!(store.try_add(&mut record).unwrap());
        }
        assert_eq!(tenantry.metrics().tenants, 5);
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_add_identifier_freed_by_another_store() {
    for_each_strategy(|strategy, tenantry| {
        seed(tenantry, "t/1", "acme");

        let mut store = tenantry.tenant_store();
        let seen = store.try_get_by_identifier("acme").unwrap();
        assert_eq!(seen.map(|r| r.id).as_deref(), Some("t/1"));

        assert!(tenantry.tenant_store().try_remove("t/1").unwrap());

        let outcome = store
            .add(&mut TenantRecord::new("t/2", "acme", "Acme again"))
            .unwrap();
        assert_eq!(outcome, Outcome::Success, "{:?}: freed identifier should be reusable", strategy);
        assert_eq!(reservation_owner(tenantry, "acme").as_deref(), Some("t/2"));
        assert_reservations_match_records(tenantry);
    });
}

// =============================================================================
// VALIDATION AND IDS
// =============================================================================

#[test]
fn test_add_requires_identifier_and_name() {
    for_each_strategy(|_, tenantry| {
        let mut store = tenantry.tenant_store();

        let err = store
            .try_add(&mut TenantRecord::new("t/1", "  ", "Name"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = store
            .try_add(&mut TenantRecord::new("t/1", "acme", ""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        assert_eq!(tenantry.metrics().reservations, 0);
        assert_eq!(tenantry.metrics().tenants, 0);
    });
}

#[test]
fn test_add_assigns_id_when_empty() {
    for_each_strategy(|_, tenantry| {
        let mut record = TenantRecord::new("", "acme", "Acme");
        assert!(tenantry.tenant_store().try_add(&mut record).unwrap());

        assert!(record.id.starts_with("tenantrecords/"));
        assert_eq!(reservation_owner(tenantry, "acme"), Some(record.id.clone()));
    });
}

#[test]
fn test_add_with_taken_id_is_refused() {
    for_each_strategy(|strategy, tenantry| {
        seed(tenantry, "t/1", "first");

        let mut store = tenantry.tenant_store();
        let outcome = store
            .add(&mut TenantRecord::new("t/1", "second", "Same id"))
            .unwrap();
        assert_eq!(outcome, Outcome::Conflict, "{:?}", strategy);

        assert!(reservation_owner(tenantry, "second").is_none());
        assert_eq!(stored_tenant(tenantry, "t/1").unwrap().identifier, "first");
    });
}

#[test]
fn test_connection_string_round_trips() {
    for_each_strategy(|_, tenantry| {
        let mut record = TenantRecord::new("t/1", "acme", "Acme");
        record.connection_string = Some("Server=db1;Database=acme".into());
        assert!(tenantry.tenant_store().try_add(&mut record).unwrap());

        let stored = stored_tenant(tenantry, "t/1").unwrap();
        assert_eq!(stored.connection_string.as_deref(), Some("Server=db1;Database=acme"));
    });
}
