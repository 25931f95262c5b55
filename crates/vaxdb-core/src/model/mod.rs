//! Domain records - one type per collection
//!
//! Field names serialize in camelCase; this is the persisted document shape
//! and the export format. Optional fields default to `None` when absent so
//! documents written before a field existed still decode.

mod checkin;
mod client_account;
mod inventory;
mod invoice;
mod project;
mod settings;
mod template;

pub use checkin::{CheckIn, CheckInStatus, Language};
pub use client_account::ClientAccount;
pub use inventory::InventoryItem;
pub use invoice::InvoiceRecord;
pub use project::{Project, ProjectStatus};
pub use settings::Settings;
pub use template::VaccineTemplate;

/// Milliseconds since the Unix epoch, the `timestamp` convention throughout
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a fresh check-in id (UUID v4)
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
