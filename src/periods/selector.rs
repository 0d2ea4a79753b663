use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::promotions::Promotion;
use crate::types::PromotionId;

/// which rule decides a payment's duration and price.
///
/// `P` is the promotion payload: a [`PromotionId`] straight off the request,
/// the loaded [`Promotion`] once it has been fetched and checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodSelector<P = Promotion> {
    /// one day, caller-priced
    DayPass { amount: Money },
    /// promotion price, promotion months or the requested period
    Promotion { promotion: P },
    /// desk-entered month count, caller-priced
    ManualMonths { months: u32, amount: Money },
    /// requested period, caller-priced
    Plain { amount: Money },
}

impl PeriodSelector<PromotionId> {
    /// build a selector from the loose flags of a payment form.
    ///
    /// day pass excludes both promotion and manual months. a promotion
    /// outranks manual months, which are then ignored.
    pub fn from_fields(
        day_pass: bool,
        promotion_id: Option<PromotionId>,
        manual_months: Option<u32>,
        amount: Option<Money>,
    ) -> Result<Self> {
        if day_pass {
            if promotion_id.is_some() {
                return Err(BillingError::invalid_input(
                    "a day pass cannot be combined with a promotion",
                ));
            }
            if manual_months.is_some() {
                return Err(BillingError::invalid_input(
                    "a day pass cannot be combined with a month count",
                ));
            }
            return Ok(PeriodSelector::DayPass {
                amount: required_amount(amount)?,
            });
        }

        if let Some(id) = promotion_id {
            return Ok(PeriodSelector::Promotion { promotion: id });
        }

        if let Some(months) = manual_months {
            if months == 0 {
                return Err(BillingError::invalid_input(
                    "month count must be a positive integer",
                ));
            }
            return Ok(PeriodSelector::ManualMonths {
                months,
                amount: required_amount(amount)?,
            });
        }

        Ok(PeriodSelector::Plain {
            amount: required_amount(amount)?,
        })
    }

    /// promotion id to fetch, if any
    pub fn promotion_id(&self) -> Option<PromotionId> {
        match self {
            PeriodSelector::Promotion { promotion } => Some(*promotion),
            _ => None,
        }
    }

    /// swap the promotion id for the loaded record
    pub fn load<F>(self, fetch: F) -> Result<PeriodSelector<Promotion>>
    where
        F: FnOnce(PromotionId) -> Result<Promotion>,
    {
        Ok(match self {
            PeriodSelector::DayPass { amount } => PeriodSelector::DayPass { amount },
            PeriodSelector::Promotion { promotion } => PeriodSelector::Promotion {
                promotion: fetch(promotion)?,
            },
            PeriodSelector::ManualMonths { months, amount } => {
                PeriodSelector::ManualMonths { months, amount }
            }
            PeriodSelector::Plain { amount } => PeriodSelector::Plain { amount },
        })
    }
}

fn required_amount(amount: Option<Money>) -> Result<Money> {
    amount.ok_or_else(|| BillingError::InvalidAmount {
        amount: "missing".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_day_pass_and_promotion_conflict() {
        let err = PeriodSelector::from_fields(
            true,
            Some(Uuid::new_v4()),
            None,
            Some(Money::from_major(5)),
        )
        .unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput { .. }));
    }

    #[test]
    fn test_day_pass_and_months_conflict() {
        let err =
            PeriodSelector::from_fields(true, None, Some(2), Some(Money::from_major(5))).unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput { .. }));
    }

    #[test]
    fn test_promotion_outranks_manual_months() {
        let id = Uuid::new_v4();
        let selector = PeriodSelector::from_fields(false, Some(id), Some(6), None).unwrap();
        assert_eq!(selector, PeriodSelector::Promotion { promotion: id });
        assert_eq!(selector.promotion_id(), Some(id));
    }

    #[test]
    fn test_zero_manual_months() {
        let err =
            PeriodSelector::from_fields(false, None, Some(0), Some(Money::from_major(30))).unwrap_err();
        assert!(matches!(err, BillingError::InvalidInput { .. }));
    }

    #[test]
    fn test_missing_amount() {
        let err = PeriodSelector::from_fields(false, None, None, None).unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount { .. }));

        // promotions bring their own price
        assert!(PeriodSelector::from_fields(false, Some(Uuid::new_v4()), None, None).is_ok());
    }

    #[test]
    fn test_load_propagates_lookup_failure() {
        let id = Uuid::new_v4();
        let selector = PeriodSelector::from_fields(false, Some(id), None, None).unwrap();
        let err = selector
            .load(|id| Err(BillingError::PromotionNotFound { id }))
            .unwrap_err();
        assert_eq!(err, BillingError::PromotionNotFound { id });
    }

    #[test]
    fn test_load_skips_fetch_without_promotion() {
        let selector =
            PeriodSelector::from_fields(false, None, None, Some(Money::from_major(30))).unwrap();
        let loaded = selector
            .load(|_| panic!("no promotion to fetch"))
            .unwrap();
        assert_eq!(loaded, PeriodSelector::Plain { amount: Money::from_major(30) });
    }
}
