use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};
use crate::types::PaymentPeriod;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// maximum characters allowed in payment notes
    pub notes_max_length: usize,
    /// label recorded when duration does not come from a period
    pub default_period_label: PaymentPeriod,
    /// iso 4217 code shown on receipts
    pub currency: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            notes_max_length: 75,
            default_period_label: PaymentPeriod::Monthly,
            currency: "TND".to_string(),
        }
    }
}

impl EngineConfig {
    /// load from json, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| BillingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.notes_max_length == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "notes_max_length must be positive".to_string(),
            });
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(BillingError::InvalidConfiguration {
                message: format!("currency must be a 3-letter code, got {:?}", self.currency),
            });
        }

        Ok(())
    }

    /// check notes against the configured limit, returning the trimmed text
    pub fn normalize_notes(&self, notes: Option<&str>) -> Result<Option<String>> {
        let notes = match notes.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => return Ok(None),
        };

        let length = notes.chars().count();
        if length > self.notes_max_length {
            return Err(BillingError::NotesTooLong {
                length,
                max: self.notes_max_length,
            });
        }

        Ok(Some(notes.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.notes_max_length, 75);
        assert_eq!(config.default_period_label, PaymentPeriod::Monthly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "notes_max_length": 120 }"#).unwrap();
        assert_eq!(config.notes_max_length, 120);
        assert_eq!(config.currency, "TND");
    }

    #[test]
    fn test_rejects_bad_json_and_values() {
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(BillingError::InvalidConfiguration { .. })
        ));
        assert!(EngineConfig::from_json(r#"{ "notes_max_length": 0 }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "currency": "dinar" }"#).is_err());
    }

    #[test]
    fn test_notes_normalization() {
        let config = EngineConfig::default();
        assert_eq!(config.normalize_notes(None).unwrap(), None);
        assert_eq!(config.normalize_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            config.normalize_notes(Some("  cash ")).unwrap(),
            Some("cash".to_string())
        );

        let long = "x".repeat(76);
        assert_eq!(
            config.normalize_notes(Some(&long)).unwrap_err(),
            BillingError::NotesTooLong { length: 76, max: 75 }
        );
    }
}
