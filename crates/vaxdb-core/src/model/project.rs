use serde::{Deserialize, Serialize};

use crate::record::StoreRecord;

/// Lifecycle state of a vaccination drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
    PendingApproval,
    Rejected,
}

/// Project - a vaccination drive or client engagement
///
/// Check-ins reference a project by id; the link is weak and survives
/// project deletion as a dangling id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Auto-assigned primary key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub name: String,
    /// Organization name used on invoices
    pub client_name: String,
    pub invoice_address: String,
    pub contact_person: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub status: ProjectStatus,
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_patients: Option<i64>,

    // Defaults applied to check-ins under this project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_vaccine_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_expiry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_account_id: Option<i64>,
}

impl Project {
    /// Create an active project with the mandatory fields set
    pub fn new(
        name: String,
        client_name: String,
        invoice_address: String,
        contact_person: String,
        timestamp: i64,
    ) -> Self {
        Self {
            id: None,
            name,
            client_name,
            invoice_address,
            contact_person,
            contact_email: None,
            status: ProjectStatus::Active,
            timestamp,
            start_date: None,
            end_date: None,
            estimated_patients: None,
            default_vaccine_name: None,
            default_batch: None,
            default_expiry: None,
            client_account_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }
}

impl StoreRecord for Project {
    const COLLECTION: &'static str = "projects";
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn assign_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_is_active_without_key() {
        let p = Project::new(
            "Factory Drive".into(),
            "Acme Sdn Bhd".into(),
            "1 Jalan Industri".into(),
            "Puan Siti".into(),
            42,
        );
        assert!(p.is_active());
        assert!(p.id.is_none());
        assert!(p.key().is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        let mut p = Project::new("D".into(), "C".into(), "A".into(), "P".into(), 1);
        p.status = ProjectStatus::PendingApproval;
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["status"], "pending_approval");
        assert_eq!(json["clientName"], "C");
    }
}
