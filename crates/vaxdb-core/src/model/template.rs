use serde::{Deserialize, Serialize};

use crate::record::StoreRecord;

/// VaccineTemplate - a reusable prefill for the administration form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccineTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Display name, e.g. "Pfizer Booster Stock"
    pub name: String,
    pub vaccine_name: String,
    pub batch: String,
    pub expiry: String,
    pub site: String,
    pub route: String,
}

impl VaccineTemplate {
    pub fn new(
        name: String,
        vaccine_name: String,
        batch: String,
        expiry: String,
        site: String,
        route: String,
    ) -> Self {
        Self {
            id: None,
            name,
            vaccine_name,
            batch,
            expiry,
            site,
            route,
        }
    }
}

impl StoreRecord for VaccineTemplate {
    const COLLECTION: &'static str = "templates";
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn assign_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}
