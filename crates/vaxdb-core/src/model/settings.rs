use serde::{Deserialize, Serialize};

use crate::record::StoreRecord;

/// Settings - clinic-wide configuration singleton
///
/// Lives at key 1 in its collection. A fresh store is seeded with
/// `Settings::defaults()` so reads never come back empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub doctor_name: String,
    pub clinic_name: String,
    /// Short numeric passcode gating the staff screens
    pub passcode: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n8n_webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
}

impl Settings {
    /// Row seeded on first open
    pub fn defaults() -> Self {
        Self {
            id: Some(1),
            doctor_name: "Dr. Admin".to_string(),
            clinic_name: "My Clinic".to_string(),
            passcode: "1234".to_string(),
            openai_api_key: None,
            n8n_webhook_url: None,
            bank_name: None,
            bank_account: None,
        }
    }
}

impl StoreRecord for Settings {
    const COLLECTION: &'static str = "settings";
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn assign_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}
