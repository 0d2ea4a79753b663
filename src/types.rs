use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a client
pub type ClientId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// unique identifier for a promotion
pub type PromotionId = Uuid;

/// subscription period label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPeriod {
    Monthly,
    Quarterly,
    Annual,
}

impl PaymentPeriod {
    /// number of calendar months the period covers
    pub fn months(&self) -> u32 {
        match self {
            PaymentPeriod::Monthly => 1,
            PaymentPeriod::Quarterly => 3,
            PaymentPeriod::Annual => 12,
        }
    }
}

impl fmt::Display for PaymentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentPeriod::Monthly => "Monthly",
            PaymentPeriod::Quarterly => "Quarterly",
            PaymentPeriod::Annual => "Annual",
        };
        f.write_str(label)
    }
}

/// where a payment's duration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Coverage {
    /// single day
    DayPass,
    /// month count fixed by the promotion
    PromotionMonths { months: u32 },
    /// month count typed in at the desk
    ManualMonths { months: u32 },
    /// standard period mapping
    Period { period: PaymentPeriod },
}

impl Coverage {
    /// human label used on receipts
    pub fn describe(&self) -> String {
        match self {
            Coverage::DayPass => "Day pass".to_string(),
            Coverage::PromotionMonths { months } => format!("{} months (promotion)", months),
            Coverage::ManualMonths { months } => format!("{} months", months),
            Coverage::Period { period } => period.to_string(),
        }
    }
}

/// gym client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub registration_date: NaiveDate,
    /// mirrors the period label of the latest payment; never authoritative
    pub subscription_period: Option<PaymentPeriod>,
}

impl Client {
    pub fn new(full_name: impl Into<String>, registration_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            registration_date,
            subscription_period: None,
        }
    }
}

/// persisted payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub client_id: ClientId,
    pub promotion_id: Option<PromotionId>,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub next_payment_date: NaiveDate,
    pub subscription_period: PaymentPeriod,
    pub coverage: Coverage,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// subscription still running on `today` (expires after its next payment date)
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        self.next_payment_date >= today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_months() {
        assert_eq!(PaymentPeriod::Monthly.months(), 1);
        assert_eq!(PaymentPeriod::Quarterly.months(), 3);
        assert_eq!(PaymentPeriod::Annual.months(), 12);
    }

    #[test]
    fn test_period_wire_format() {
        let json = serde_json::to_string(&PaymentPeriod::Quarterly).unwrap();
        assert_eq!(json, "\"QUARTERLY\"");
    }

    #[test]
    fn test_coverage_labels() {
        assert_eq!(Coverage::DayPass.describe(), "Day pass");
        assert_eq!(
            Coverage::PromotionMonths { months: 4 }.describe(),
            "4 months (promotion)"
        );
        assert_eq!(
            Coverage::Period { period: PaymentPeriod::Annual }.describe(),
            "Annual"
        );
    }
}
