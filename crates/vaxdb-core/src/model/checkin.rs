use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};
use crate::record::StoreRecord;

/// Workflow state of a patient visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Waiting,
    InProgress,
    Completed,
}

/// Patient-facing language preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Bm,
}

/// CheckIn - one patient visit
///
/// Keyed by a caller-generated UUID string. Created at check-in, mutated by
/// clinical staff during the visit; status transitions stand in for
/// deletion in the normal flow. The `projectId` link is weak: deleting the
/// Project leaves it dangling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Primary key (UUID)
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    pub full_name: String,
    pub mykad: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Date-prefixed daily sequence, e.g. "20260823-001"
    pub queue_number: String,
    pub status: CheckInStatus,
    pub language: Language,
    /// Check-in time, milliseconds since epoch
    pub timestamp: i64,

    // Administration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccinator: Option<String>,

    // Vitals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bp_systolic: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bp_diastolic: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,

    /// 1 or 2
    pub dose: u8,
    /// ISO date of the dose-2 appointment, when scheduled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_appointment: Option<String>,

    /// 1-5 when the patient left feedback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_comment: Option<String>,
}

impl CheckIn {
    /// Create a waiting check-in with the mandatory fields set
    pub fn new(
        id: String,
        full_name: String,
        mykad: String,
        queue_number: String,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            project_id: None,
            full_name,
            mykad,
            phone: None,
            email: None,
            queue_number,
            status: CheckInStatus::Waiting,
            language: Language::En,
            timestamp,
            vaccine_name: None,
            batch: None,
            expiry: None,
            site: None,
            route: None,
            administered_at: None,
            vaccinator: None,
            bp_systolic: None,
            bp_diastolic: None,
            pulse: None,
            notes: None,
            certificate_id: None,
            dose: 1,
            next_appointment: None,
            feedback_rating: None,
            feedback_comment: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == CheckInStatus::Completed
    }
}

impl StoreRecord for CheckIn {
    const COLLECTION: &'static str = "checkins";
    type Key = String;

    fn key(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn assign_key(&mut self, key: String) {
        self.id = key;
    }

    fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.dose) {
            return Err(StoreError::invalid_record(
                Self::COLLECTION,
                format!("dose must be 1 or 2, got {}", self.dose),
            ));
        }
        if let Some(rating) = self.feedback_rating {
            if !(1..=5).contains(&rating) {
                return Err(StoreError::invalid_record(
                    Self::COLLECTION,
                    format!("feedback rating must be 1-5, got {}", rating),
                ));
            }
        }
        Ok(())
    }
}
