pub mod eligibility;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::types::PromotionId;

pub use eligibility::{check_eligibility, is_eligible};

/// administrator-defined offer fixing price and optionally duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub name: String,
    pub notes: Option<String>,
    pub fixed_price: Money,
    pub subscription_months: Option<u32>,
    pub active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// fields an administrator fills in when creating a promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionDraft {
    pub name: String,
    pub notes: Option<String>,
    pub fixed_price: Money,
    pub subscription_months: Option<u32>,
    pub active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Promotion {
    /// validate a draft and assign an id
    pub fn create(draft: PromotionDraft) -> Result<Self> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(BillingError::invalid_input("promotion name is required"));
        }

        if !draft.fixed_price.is_positive() {
            return Err(BillingError::InvalidAmount {
                amount: draft.fixed_price.to_string(),
            });
        }

        if draft.subscription_months == Some(0) {
            return Err(BillingError::invalid_input(
                "promotion month count must be a positive integer",
            ));
        }

        if let (Some(start), Some(end)) = (draft.start_date, draft.end_date) {
            if start > end {
                return Err(BillingError::invalid_input(format!(
                    "promotion starts {} after it ends {}",
                    start, end
                )));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            notes: draft
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            fixed_price: draft.fixed_price,
            subscription_months: draft.subscription_months,
            active: draft.active,
            start_date: draft.start_date,
            end_date: draft.end_date,
            deleted_at: None,
        })
    }

    /// month count when the promotion fixes the duration
    pub fn months(&self) -> Option<u32> {
        self.subscription_months.filter(|m| *m > 0)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// promotions referenced by payments are kept, only marked deleted
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.is_deleted() {
            return Err(BillingError::invalid_input(format!(
                "promotion {} already deleted",
                self.id
            )));
        }
        self.deleted_at = Some(now);
        self.active = false;
        Ok(())
    }
}
