//! Reservation key encoding
//!
//! Direct-value keys look like `tidentifier/acme`. Shadow reservation
//! document ids look like `uniquereservations/tntident/acme` with the
//! store's default conventions.

use tenantry_core::ReservationType;
use tenantry_storage::StoreConventions;

/// Collection holding shadow reservation documents
pub const RESERVATION_COLLECTION: &str = "UniqueReservations";

/// Compare-exchange key of a direct-value reservation
pub fn compare_exchange_key(reservation_type: ReservationType, normalized_value: &str) -> String {
    format!(
        "{}/{}",
        reservation_type.key_prefix().trim_end_matches('/'),
        normalized_value
    )
}

/// Document id of a shadow reservation
pub fn reservation_document_id(
    conventions: &StoreConventions,
    reservation_type: ReservationType,
    normalized_value: &str,
) -> String {
    let collection_prefix = conventions.collection_prefix(RESERVATION_COLLECTION);
    conventions.document_id(&[
        &collection_prefix,
        reservation_type.document_prefix(),
        normalized_value,
    ])
}
