use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::selector::PeriodSelector;
use crate::calendar::{add_days, add_months};
use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::overlap::PaymentInterval;
use crate::types::{Coverage, PaymentPeriod, PromotionId};

/// outcome of applying the precedence rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResolution {
    pub payment_date: NaiveDate,
    pub next_payment_date: NaiveDate,
    pub amount: Money,
    /// reporting tag; the real duration is in `coverage`
    pub period_label: PaymentPeriod,
    pub coverage: Coverage,
    pub promotion_id: Option<PromotionId>,
}

impl PeriodResolution {
    pub fn interval(&self) -> Result<PaymentInterval> {
        PaymentInterval::new(self.payment_date, self.next_payment_date)
    }
}

/// turn a payment date and selector into a coverage interval and price.
///
/// first matching rule wins:
/// 1. day pass: one day, caller amount
/// 2. promotion with a month count: promotion price, promotion months
/// 3. promotion without one: promotion price, requested period
/// 4. manual months: caller amount
/// 5. plain: requested period, caller amount
pub fn resolve(
    payment_date: NaiveDate,
    requested_period: Option<PaymentPeriod>,
    selector: &PeriodSelector,
    config: &EngineConfig,
) -> Result<PeriodResolution> {
    let label = requested_period.unwrap_or(config.default_period_label);

    let (amount, coverage, promotion_id) = match selector {
        PeriodSelector::DayPass { amount } => (*amount, Coverage::DayPass, None),
        PeriodSelector::Promotion { promotion } => {
            // promotion price always replaces whatever was typed in
            let coverage = match promotion.months() {
                Some(months) => Coverage::PromotionMonths { months },
                None => Coverage::Period {
                    period: requested_period.ok_or(BillingError::MissingPeriod)?,
                },
            };
            (promotion.fixed_price, coverage, Some(promotion.id))
        }
        PeriodSelector::ManualMonths { months, amount } => {
            if *months == 0 {
                return Err(BillingError::invalid_input(
                    "month count must be a positive integer",
                ));
            }
            (*amount, Coverage::ManualMonths { months: *months }, None)
        }
        PeriodSelector::Plain { amount } => {
            let period = requested_period.ok_or(BillingError::MissingPeriod)?;
            (*amount, Coverage::Period { period }, None)
        }
    };

    let amount = amount.ensure_positive()?;
    let next_payment_date = coverage_end(payment_date, &coverage)?;

    let period_label = match coverage {
        Coverage::Period { period } => period,
        _ => label,
    };

    Ok(PeriodResolution {
        payment_date,
        next_payment_date,
        amount,
        period_label,
        coverage,
        promotion_id,
    })
}

/// first uncovered day for `coverage` starting on `start`
pub fn coverage_end(start: NaiveDate, coverage: &Coverage) -> Result<NaiveDate> {
    let end = match coverage {
        Coverage::DayPass => add_days(start, 1)?,
        Coverage::PromotionMonths { months } | Coverage::ManualMonths { months } => {
            add_months(start, months_i32(*months)?)?
        }
        Coverage::Period { period } => add_months(start, period.months() as i32)?,
    };

    if end <= start {
        return Err(BillingError::InvalidDate {
            message: format!("coverage from {} does not move forward", start),
        });
    }
    Ok(end)
}

fn months_i32(months: u32) -> Result<i32> {
    i32::try_from(months).map_err(|_| BillingError::invalid_input(format!(
        "month count {} is too large",
        months
    )))
}
