use serde::{Deserialize, Serialize};

use crate::record::StoreRecord;

/// InventoryItem - one vaccine batch on hand
///
/// `count >= 0` is a soft invariant: the store accepts negative counts and
/// the calling screen decides whether to warn or block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub vaccine_name: String,
    pub batch_number: String,
    /// ISO date
    pub expiry_date: String,
    pub count: i64,
    pub min_threshold: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_interval_days: Option<i64>,
}

impl InventoryItem {
    pub fn new(vaccine_name: String, batch_number: String, expiry_date: String, count: i64) -> Self {
        Self {
            id: None,
            vaccine_name,
            batch_number,
            expiry_date,
            count,
            min_threshold: 10,
            dose_interval_days: None,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.count <= self.min_threshold
    }
}

impl StoreRecord for InventoryItem {
    const COLLECTION: &'static str = "inventory";
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn assign_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}
