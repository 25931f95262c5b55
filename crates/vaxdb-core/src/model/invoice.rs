use serde::{Deserialize, Serialize};

use crate::record::StoreRecord;

/// InvoiceRecord - one generated invoice
///
/// Append-only ledger by convention: callers create and read these but
/// never update them. The project reference is weak and kept for history
/// after the project is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub project_id: i64,
    pub invoice_number: String,
    pub client_name: String,
    pub amount: f64,
    /// ISO date
    pub date: String,
    /// Serialized line items, opaque to the store
    pub items_json: String,
}

impl InvoiceRecord {
    pub fn new(
        project_id: i64,
        invoice_number: String,
        client_name: String,
        amount: f64,
        date: String,
        items_json: String,
    ) -> Self {
        Self {
            id: None,
            project_id,
            invoice_number,
            client_name,
            amount,
            date,
            items_json,
        }
    }
}

impl StoreRecord for InvoiceRecord {
    const COLLECTION: &'static str = "invoices";
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
    fn round_trips_through_json() {
        let inv = InvoiceRecord::new(
            3,
            "INV-2026-014".into(),
            "Acme Sdn Bhd".into(),
            1250.50,
            "2026-08-23".into(),
            r#"[{"desc":"Influvac x50","unit":25.01}]"#.into(),
        );
        let json = serde_json::to_string(&inv).unwrap();
        let back: InvoiceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inv);
    }
}
