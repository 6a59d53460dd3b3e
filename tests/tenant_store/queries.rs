//! Query Tests
//!
//! Tests for reads:
//! - Lookup by id and by identifier
//! - Full listing and pagination

use crate::*;

fn seed_three(tenantry: &Tenantry) {
    seed(tenantry, "t/1", "alpha");
    seed(tenantry, "t/2", "Beta");
    seed(tenantry, "t/3", "gamma");
}

// =============================================================================
// LOOKUPS
// =============================================================================

#[test]
fn test_get_by_id() {
    for_each_strategy(|_, tenantry| {
        let seeded = seed(tenantry, "t/1", "acme");

        let mut store = tenantry.tenant_store();
        assert_eq!(store.try_get("t/1").unwrap(), Some(seeded));
        assert_eq!(store.try_get("t/2").unwrap(), None);
        assert!(store.try_get("").is_err());
    });
}

#[test]
fn test_get_by_identifier_raw_or_normalized() {
    for_each_strategy(|_, tenantry| {
        seed_three(tenantry);

        let mut store = tenantry.tenant_store();
        for identifier in ["Beta", "beta", "BETA"] {
            let found = store.try_get_by_identifier(identifier).unwrap();
            assert_eq!(found.map(|r| r.id).as_deref(), Some("t/2"), "lookup of {}", identifier);
        }
        assert!(store.try_get_by_identifier("delta").unwrap().is_none());
    });
}

#[test]
fn test_get_by_identifier_follows_rename() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "old");

        let mut store = tenantry.tenant_store();
        let mut record = store.try_get("t/1").unwrap().unwrap();
        record.identifier = "new".into();
        assert!(store.try_update(&mut record).unwrap());

        let mut store = tenantry.tenant_store();
        assert!(store.try_get_by_identifier("old").unwrap().is_none());
        assert_eq!(store.try_get_by_identifier("new").unwrap().unwrap().id, "t/1");
    });
}

#[test]
fn test_get_by_identifier_after_remove() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");
        assert!(tenantry.tenant_store().try_remove("t/1").unwrap());
        assert!(tenantry
            .tenant_store()
            .try_get_by_identifier("acme")
            .unwrap()
            .is_none());
    });
}

// =============================================================================
// LISTINGS
// =============================================================================

#[test]
fn test_get_all_sorted_by_id() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/3", "gamma");
        seed(tenantry, "t/1", "alpha");
        seed(tenantry, "t/2", "beta");

        let all = tenantry.tenant_store().get_all().unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t/1", "t/2", "t/3"]);
    });
}

#[test]
fn test_get_all_excludes_reservations() {
    for_each_strategy(|_, tenantry| {
        assert!(tenantry.tenant_store().get_all().unwrap().is_empty());
        seed(tenantry, "t/1", "acme");
        assert_eq!(tenantry.tenant_store().get_all().unwrap().len(), 1);
    });
}

#[test]
fn test_paginated_listing() {
    for_each_strategy(|_, tenantry| {
        seed_three(tenantry);
        let mut store = tenantry.tenant_store();

        let first = store.get_all_paginated(1, 2).unwrap();
        assert_eq!(first.total_items_count, 3);
        assert_eq!(first.items.len(), 2);

        let second = store.get_all_paginated(2, 2).unwrap();
        assert_eq!(second.total_items_count, 3);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, "t/3");

        let beyond = store.get_all_paginated(10, 2).unwrap();
        assert_eq!(beyond.total_items_count, 3);
        assert!(beyond.items.is_empty());
    });
}

#[test]
fn test_paginated_listing_rejects_zero() {
    for_each_strategy(|_, tenantry| {
        let mut store = tenantry.tenant_store();
        assert!(matches!(
            store.get_all_paginated(0, 10).unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            store.get_all_paginated(1, 0).unwrap_err(),
            Error::InvalidInput(_)
        ));
    });
}
