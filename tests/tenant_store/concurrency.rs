//! Concurrency Tests
//!
//! Tests for racing writers:
//! - Exactly one of many concurrent adds claims an identifier
//! - Stale updates lose without leaving reservations behind
//! - Concurrent renames onto the same identifier

use crate::*;
use std::sync::{Arc, Barrier};
use std::thread;

const NUM_WRITERS: usize = 8;

#[test]
fn test_concurrent_adds_same_identifier() {
    for strategy in STRATEGIES {
        let tenantry = strategy.open();
        let barrier = Arc::new(Barrier::new(NUM_WRITERS));

        let handles: Vec<_> = (0..NUM_WRITERS)
            .map(|i| {
                let tenantry = tenantry.clone();
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    let mut store = tenantry.tenant_store();
                    let mut record =
                        TenantRecord::new(format!("t/{}", i), "contested", format!("Writer {}", i));
                    barrier.wait();
                    store.try_add(&mut record).unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();

        assert_eq!(winners, 1, "{:?}: exactly one add should win", strategy);
        assert_eq!(tenantry.metrics().tenants, 1);
        assert_reservations_match_records(&tenantry);
    }
}

#[test]
fn test_concurrent_adds_distinct_identifiers() {
    for strategy in STRATEGIES {
        let tenantry = strategy.open();
        let barrier = Arc::new(Barrier::new(NUM_WRITERS));

        let handles: Vec<_> = (0..NUM_WRITERS)
            .map(|i| {
                let tenantry = tenantry.clone();
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    let mut store = tenantry.tenant_store();
                    let mut record = TenantRecord::new("", format!("tenant-{}", i), "Tenant");
                    barrier.wait();
                    store.try_add(&mut record).unwrap()
                })
            })
            .collect();

        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(tenantry.metrics().tenants, NUM_WRITERS);
        assert_reservations_match_records(&tenantry);
    }
}

#[test]
fn test_stale_update_loses() {
    for_each_strategy(|strategy, tenantry| {
        seed(tenantry, "t/1", "tenant-abc");

        let mut first = tenantry.tenant_store();
        let mut second = tenantry.tenant_store();
        let mut a = first.try_get("t/1").unwrap().unwrap();
        let mut b = second.try_get("t/1").unwrap().unwrap();

        a.identifier = "first-writer".into();
        assert!(first.try_update(&mut a).unwrap());

        b.identifier = "second-writer".into();
        assert_eq!(
            second.update(&mut b).unwrap(),
            Outcome::Conflict,
            "{:?}: stale update should lose",
            strategy
        );

        assert_eq!(reservation_owner(tenantry, "first-writer").as_deref(), Some("t/1"));
        assert!(reservation_owner(tenantry, "second-writer").is_none());
        assert!(reservation_owner(tenantry, "tenant-abc").is_none());
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_stale_update_without_rename_loses() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");

        let mut first = tenantry.tenant_store();
        let mut second = tenantry.tenant_store();
        let mut a = first.try_get("t/1").unwrap().unwrap();
        let mut b = second.try_get("t/1").unwrap().unwrap();

        a.identifier = "acme-renamed".into();
        assert!(first.try_update(&mut a).unwrap());

        b.name = "Only the name".into();
        assert!(!second.try_update(&mut b).unwrap());
        assert_eq!(stored_tenant(tenantry, "t/1").unwrap().identifier, "acme-renamed");
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_stale_remove_loses() {
    for_each_strategy(|_, tenantry| {
        seed(tenantry, "t/1", "acme");

        let mut remover = tenantry.tenant_store();
        assert!(remover.try_get("t/1").unwrap().is_some());

        let mut renamer = tenantry.tenant_store();
        let mut record = renamer.try_get("t/1").unwrap().unwrap();
        record.identifier = "acme-2".into();
        assert!(renamer.try_update(&mut record).unwrap());

        assert_eq!(remover.remove("t/1").unwrap(), Outcome::Conflict);
        assert!(stored_tenant(tenantry, "t/1").is_some());
        assert_reservations_match_records(tenantry);
    });
}

#[test]
fn test_concurrent_renames_to_same_identifier() {
    for strategy in STRATEGIES {
        let tenantry = strategy.open();
        for i in 0..NUM_WRITERS {
            seed(&tenantry, &format!("t/{}", i), &format!("start-{}", i));
        }
        let barrier = Arc::new(Barrier::new(NUM_WRITERS));

        let handles: Vec<_> = (0..NUM_WRITERS)
            .map(|i| {
                let tenantry = tenantry.clone();
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    let mut store = tenantry.tenant_store();
                    let mut record = store.try_get(&format!("t/{}", i)).unwrap().unwrap();
                    record.identifier = "target".into();
                    barrier.wait();
                    store.try_update(&mut record).unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|renamed| *renamed)
            .count();

        assert_eq!(winners, 1, "{:?}: exactly one rename should win", strategy);
        assert_eq!(tenantry.metrics().tenants, NUM_WRITERS);
        assert_reservations_match_records(&tenantry);
    }
}

#[test]
fn test_add_racing_remove_of_same_identifier() {
    for strategy in STRATEGIES {
        let tenantry = strategy.open();
        seed(&tenantry, "t/old", "recycled");
        let barrier = Arc::new(Barrier::new(2));

        let remover = {
            let tenantry = tenantry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut store = tenantry.tenant_store();
                barrier.wait();
                store.try_remove("t/old").unwrap()
            })
        };
        let adder = {
            let tenantry = tenantry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut store = tenantry.tenant_store();
                let mut record = TenantRecord::new("t/new", "recycled", "New");
                barrier.wait();
                store.try_add(&mut record).unwrap()
            })
        };

        assert!(remover.join().unwrap(), "{:?}: remove should succeed", strategy);
        let _ = adder.join().unwrap();
        assert_reservations_match_records(&tenantry);
    }
}
