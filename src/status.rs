use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::same_month;
use crate::decimal::Money;
use crate::types::{Payment, PaymentId};

/// where a client stands with their subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    /// never paid
    Unpaid,
    /// latest coverage ends today or earlier
    Late,
    /// latest coverage runs past today
    UpToDate,
}

/// snapshot of a client's payments on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientStanding {
    pub status: ClientStatus,
    /// first payment falls in the current month
    pub new_this_month: bool,
    pub latest_payment: Option<PaymentId>,
    pub paid_until: Option<NaiveDate>,
    pub total_paid: Money,
    pub payment_count: usize,
}

impl ClientStanding {
    /// deleted payments are ignored
    pub fn from_payments(payments: &[Payment], today: NaiveDate) -> Self {
        let mut active: Vec<&Payment> = payments.iter().filter(|p| !p.is_deleted()).collect();
        active.sort_by_key(|p| (p.payment_date, p.created_at));

        let latest = active.last();
        let status = match latest {
            None => ClientStatus::Unpaid,
            Some(p) if p.next_payment_date <= today => ClientStatus::Late,
            Some(_) => ClientStatus::UpToDate,
        };

        Self {
            status,
            new_this_month: active
                .first()
                .map_or(false, |p| same_month(p.payment_date, today)),
            latest_payment: latest.map(|p| p.id),
            paid_until: latest.map(|p| p.next_payment_date),
            total_paid: active.iter().map(|p| p.amount).sum(),
            payment_count: active.len(),
        }
    }
}
