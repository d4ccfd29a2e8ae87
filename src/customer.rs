use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PawnError, Result};
use crate::types::CustomerId;

/// customer registered at the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub address: String,
    /// reference of the identity document shown at registration
    pub id_proof: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        let phone = phone.into().trim().to_string();

        if name.is_empty() {
            return Err(PawnError::invalid_input("customer name is required"));
        }
        if phone.is_empty() {
            return Err(PawnError::invalid_input("customer phone is required"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            phone,
            address: String::new(),
            id_proof: String::new(),
            created_at,
        })
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_id_proof(mut self, id_proof: impl Into<String>) -> Self {
        self.id_proof = id_proof.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_customer_requires_name_and_phone() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

        assert!(Customer::new("", "98450 12345", at).is_err());
        assert!(Customer::new("Lakshmi", "   ", at).is_err());

        let customer = Customer::new("  Lakshmi ", "98450 12345", at)
            .unwrap()
            .with_address("14 Temple Street")
            .with_id_proof("AADHAAR-XXXX-1234");
        assert_eq!(customer.name, "Lakshmi");
        assert_eq!(customer.address, "14 Temple Street");
        assert_eq!(customer.created_at, at);
    }
}
