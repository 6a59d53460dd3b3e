//! Shared helpers for the tenant store tests

#![allow(dead_code)]

pub use tenantry::prelude::*;
pub use tenantry::{normalize_unique_value, FaultMode, Operation, ReservationType};

pub use tenantry_reservation::UniquenessGuard;

/// Both reservation strategies
pub const STRATEGIES: [Strategy; 2] = [Strategy::DirectValue, Strategy::ShadowDocument];

/// Reservation strategy under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectValue,
    ShadowDocument,
}

impl Strategy {
    pub fn open(self) -> Tenantry {
        init_tracing();
        Tenantry::builder()
            .shadow_documents(self == Strategy::ShadowDocument)
            .open()
    }
}

/// Route tracing output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Run `test` once per strategy on a fresh directory
pub fn for_each_strategy(test: impl Fn(Strategy, &Tenantry)) {
    for strategy in STRATEGIES {
        let tenantry = strategy.open();
        test(strategy, &tenantry);
    }
}

/// Add a tenant in its own store, asserting success
pub fn seed(tenantry: &Tenantry, id: &str, identifier: &str) -> TenantRecord {
    let mut record = TenantRecord::new(id, identifier, format!("Tenant {}", identifier));
    let added = tenantry
        .tenant_store()
        .try_add(&mut record)
        .expect("seeding should not fail");
    assert!(added, "seeding {} should succeed", identifier);
    record
}

/// Owner id recorded by the reservation for `identifier`
pub fn reservation_owner(tenantry: &Tenantry, identifier: &str) -> Option<String> {
    let guard = tenantry.options().guard();
    let mut session = tenantry.database().open_session();
    guard
        .owner_of(
            &mut session,
            ReservationType::Identifier,
            &normalize_unique_value(identifier),
        )
        .expect("reservation lookup should not fail")
}

/// Tenant as currently stored, bypassing any session
pub fn stored_tenant(tenantry: &Tenantry, id: &str) -> Option<TenantRecord> {
    tenantry
        .tenant_store()
        .try_get(id)
        .expect("load should not fail")
}

/// Every record owns exactly the reservation for its identifier, and no
/// other reservation exists
pub fn assert_reservations_match_records(tenantry: &Tenantry) {
    let records = tenantry
        .tenant_store()
        .get_all()
        .expect("listing should not fail");
    for record in &records {
        assert_eq!(
            reservation_owner(tenantry, &record.identifier).as_deref(),
            Some(record.id.as_str()),
            "record {} has no reservation for {}",
            record.id,
            record.identifier
        );
    }
    assert_eq!(
        tenantry.metrics().reservations,
        records.len(),
        "reservation count should match record count"
    );
}
