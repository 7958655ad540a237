// 🏢 Company Record - what we cache per registry id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive company data for one registry id.
///
/// `registry_id` is the natural key and always carries the caller's raw
/// spelling. `id` is the store's surrogate key and stays `None` until the
/// record has been inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    #[serde(default)]
    pub id: Option<i64>,

    pub registry_id: String,

    // ========================================================================
    // NAMES
    // ========================================================================
    /// Legal name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub trade_name: String,

    // ========================================================================
    // ADDRESS
    // ========================================================================
    #[serde(default)]
    pub street: String,

    #[serde(default)]
    pub number: String,

    #[serde(default)]
    pub complement: String,

    #[serde(default)]
    pub postal_code: String,

    #[serde(default)]
    pub district: String,

    #[serde(default)]
    pub municipality: String,

    /// Two-letter state code (UF)
    #[serde(default)]
    pub state: String,

    // ========================================================================
    // CONTACT + REGISTRY STATUS
    // ========================================================================
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    /// Responsible federative entity (EFR)
    #[serde(default)]
    pub registry_authority: String,

    /// Registration situation, e.g. "ATIVA"
    #[serde(default)]
    pub status: String,

    /// When the lookup provider answered for this record
    pub fetched_at: DateTime<Utc>,
}

impl CompanyRecord {
    /// Empty record for a registry id, stamped with the current time
    pub fn new(registry_id: &str) -> Self {
        CompanyRecord {
            id: None,
            registry_id: registry_id.to_string(),
            name: String::new(),
            trade_name: String::new(),
            street: String::new(),
            number: String::new(),
            complement: String::new(),
            postal_code: String::new(),
            district: String::new(),
            municipality: String::new(),
            state: String::new(),
            email: String::new(),
            phone: String::new(),
            registry_authority: String::new(),
            status: String::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_stored(&self) -> bool {
        self.id.is_some()
    }

    /// Single-line address for display
    pub fn address_line(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        let street = [self.street.as_str(), self.number.as_str(), self.complement.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if !street.is_empty() {
            parts.push(street);
        }
        if !self.district.is_empty() {
            parts.push(self.district.clone());
        }

        let city = match (self.municipality.is_empty(), self.state.is_empty()) {
            (false, false) => format!("{}/{}", self.municipality, self.state),
            (false, true) => self.municipality.clone(),
            (true, false) => self.state.clone(),
            (true, true) => String::new(),
        };
        if !city.is_empty() {
            parts.push(city);
        }
        if !self.postal_code.is_empty() {
            parts.push(format!("CEP {}", self.postal_code));
        }

        parts.join(" - ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_not_stored() {
        let record = CompanyRecord::new("11.222.333/0001-81");
        assert_eq!(record.registry_id, "11.222.333/0001-81");
        assert!(!record.is_stored());
        assert!(record.name.is_empty());
    }

    #[test]
    fn test_address_line() {
        let mut record = CompanyRecord::new("11.222.333/0001-81");
        record.street = "AV PAULISTA".to_string();
        record.number = "1000".to_string();
        record.district = "BELA VISTA".to_string();
        record.municipality = "SAO PAULO".to_string();
        record.state = "SP".to_string();
        record.postal_code = "01310-100".to_string();

        assert_eq!(
            record.address_line(),
            "AV PAULISTA, 1000 - BELA VISTA - SAO PAULO/SP - CEP 01310-100"
        );

        let empty = CompanyRecord::new("11.222.333/0001-81");
        assert_eq!(empty.address_line(), "");
    }

    #[test]
    fn test_json_shape() {
        let mut record = CompanyRecord::new("11.222.333/0001-81");
        record.id = Some(7);
        record.name = "ACME LTDA".to_string();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["registry_id"], "11.222.333/0001-81");
        assert_eq!(json["name"], "ACME LTDA");
        assert!(json["fetched_at"].is_string());
    }
}
