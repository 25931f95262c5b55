use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};
use crate::record::StoreRecord;

/// ClientAccount - login for a corporate client's self-service portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub email: String,
    /// Obfuscated with [`crate::auth::hash_password`], never stored raw
    pub password: String,
    pub name: String,
    pub company: String,
    /// Milliseconds since epoch
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<i64>,
}

impl ClientAccount {
    pub fn new(
        email: String,
        password: String,
        name: String,
        company: String,
        created_at: i64,
    ) -> Self {
        Self {
            id: None,
            email,
            password,
            name,
            company,
            created_at,
            last_login: None,
        }
    }
}

impl StoreRecord for ClientAccount {
    const COLLECTION: &'static str = "clientAccounts";
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn assign_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn validate(&self) -> Result<()> {
        if !self.email.contains('@') {
            return Err(StoreError::invalid_record(
                Self::COLLECTION,
                format!("email {:?} is not an address", self.email),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_an_address() {
        let mut a = ClientAccount::new(
            "hr@acme.example".into(),
            "aGFzaGVk".into(),
            "Puan Siti".into(),
            "Acme Sdn Bhd".into(),
            1,
        );
        assert!(a.validate().is_ok());
        a.email = "not-an-email".into();
        assert!(a.validate().is_err());
    }
}
