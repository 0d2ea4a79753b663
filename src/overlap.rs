//! half-open coverage intervals and the per-client overlap rule

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{BillingError, Result};
use crate::types::{Payment, PaymentId};

/// `[start, end)`, always non-empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct PaymentInterval {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct IntervalBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<IntervalBounds> for PaymentInterval {
    type Error = BillingError;

    fn try_from(bounds: IntervalBounds) -> Result<Self> {
        PaymentInterval::new(bounds.start, bounds.end)
    }
}

impl PaymentInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(BillingError::InvalidDate {
                message: format!("coverage ends {} on or before it starts {}", end, start),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// shares at least one covered day; touching endpoints do not count
    pub fn overlaps(&self, other: &PaymentInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for PaymentInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// an active payment's interval as read from storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingInterval {
    pub payment_id: PaymentId,
    pub interval: PaymentInterval,
}

impl ExistingInterval {
    pub fn from_payment(payment: &Payment) -> Result<Self> {
        Ok(Self {
            payment_id: payment.id,
            interval: PaymentInterval::new(payment.payment_date, payment.next_payment_date)?,
        })
    }
}

/// first existing interval that overlaps `candidate`, skipping `exclude`
pub fn find_conflict<'a>(
    existing: &'a [ExistingInterval],
    candidate: &PaymentInterval,
    exclude: Option<PaymentId>,
) -> Option<&'a ExistingInterval> {
    existing
        .iter()
        .filter(|e| Some(e.payment_id) != exclude)
        .find(|e| e.interval.overlaps(candidate))
}

/// accept `candidate` only if it overlaps none of the client's intervals.
/// `existing` must already be limited to one client's non-deleted payments.
pub fn validate_no_overlap(
    existing: &[ExistingInterval],
    candidate: &PaymentInterval,
    exclude: Option<PaymentId>,
) -> Result<()> {
    match find_conflict(existing, candidate, exclude) {
        Some(conflict) => Err(BillingError::OverlapConflict {
            payment_id: conflict.payment_id,
            start: conflict.interval.start(),
            end: conflict.interval.end(),
        }),
        None => Ok(()),
    }
}
