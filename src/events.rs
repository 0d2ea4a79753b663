use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ClientId, Coverage, PaymentId, PaymentPeriod, PromotionId};

/// payment history entries emitted by the billing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    PaymentCreated {
        payment_id: PaymentId,
        client_id: ClientId,
        amount: Money,
        payment_date: NaiveDate,
        next_payment_date: NaiveDate,
        coverage: Coverage,
        timestamp: DateTime<Utc>,
    },
    PromotionApplied {
        payment_id: PaymentId,
        promotion_id: PromotionId,
        price: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRescheduled {
        payment_id: PaymentId,
        old_payment_date: NaiveDate,
        old_next_payment_date: NaiveDate,
        new_payment_date: NaiveDate,
        new_next_payment_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    PaymentDeleted {
        payment_id: PaymentId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRejected {
        client_id: ClientId,
        reason: String,
        conflicting_payment: Option<PaymentId>,
        timestamp: DateTime<Utc>,
    },
    ClientPeriodProjected {
        client_id: ClientId,
        period: PaymentPeriod,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// payment the entry belongs to, if any
    pub fn payment_id(&self) -> Option<PaymentId> {
        match self {
            Event::PaymentCreated { payment_id, .. }
            | Event::PromotionApplied { payment_id, .. }
            | Event::PaymentRescheduled { payment_id, .. }
            | Event::PaymentDeleted { payment_id, .. } => Some(*payment_id),
            Event::PaymentRejected { .. } | Event::ClientPeriodProjected { .. } => None,
        }
    }
}

/// event store for collecting history during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// history of a single payment, oldest first
    pub fn for_payment(&self, payment_id: PaymentId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.payment_id() == Some(payment_id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
