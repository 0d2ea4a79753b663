use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::overlap::{validate_no_overlap, ExistingInterval, PaymentInterval};
use crate::periods::{resolve, PeriodResolution, PeriodSelector};
use crate::promotions::{check_eligibility, Promotion};
use crate::store::PaymentStore;
use crate::types::{ClientId, Coverage, PaymentId, PaymentPeriod, PromotionId};

/// raw payment-creation input as it arrives from a form or api call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub client_id: ClientId,
    /// defaults to today
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub period: Option<PaymentPeriod>,
    /// ignored when a promotion applies
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub promotion_id: Option<PromotionId>,
    #[serde(default)]
    pub manual_months: Option<u32>,
    #[serde(default)]
    pub day_pass: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            payment_date: None,
            period: None,
            amount: None,
            promotion_id: None,
            manual_months: None,
            day_pass: false,
            notes: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    pub fn period(mut self, period: PaymentPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn promotion(mut self, id: PromotionId) -> Self {
        self.promotion_id = Some(id);
        self
    }

    pub fn manual_months(mut self, months: u32) -> Self {
        self.manual_months = Some(months);
        self
    }

    pub fn day_pass(mut self) -> Self {
        self.day_pass = true;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// tagged selector for this request's duration/price rule
    pub fn selector(&self) -> Result<PeriodSelector<PromotionId>> {
        // the plain path needs a period before it needs an amount
        let plain = !self.day_pass && self.promotion_id.is_none() && self.manual_months.is_none();
        if plain && self.period.is_none() {
            return Err(BillingError::MissingPeriod);
        }
        PeriodSelector::from_fields(
            self.day_pass,
            self.promotion_id,
            self.manual_months,
            self.amount,
        )
    }
}

/// accepted payment, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDecision {
    pub client_id: ClientId,
    pub promotion_id: Option<PromotionId>,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub next_payment_date: NaiveDate,
    pub period_label: PaymentPeriod,
    pub coverage: Coverage,
    pub notes: Option<String>,
}

impl PaymentDecision {
    fn from_resolution(
        client_id: ClientId,
        resolution: PeriodResolution,
        notes: Option<String>,
    ) -> Self {
        Self {
            client_id,
            promotion_id: resolution.promotion_id,
            amount: resolution.amount,
            payment_date: resolution.payment_date,
            next_payment_date: resolution.next_payment_date,
            period_label: resolution.period_label,
            coverage: resolution.coverage,
            notes,
        }
    }

    pub fn interval(&self) -> Result<PaymentInterval> {
        PaymentInterval::new(self.payment_date, self.next_payment_date)
    }
}

/// promotion check, period resolution and overlap validation in order
#[derive(Debug, Clone, Default)]
pub struct PaymentEngine {
    pub config: EngineConfig,
}

impl PaymentEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// decide a request against records the caller already loaded.
    ///
    /// `promotion` must be the record named by `request.promotion_id`;
    /// `existing` the client's non-deleted intervals. `exclude` skips the
    /// payment being edited.
    pub fn decide(
        &self,
        request: &PaymentRequest,
        payment_date: NaiveDate,
        promotion: Option<&Promotion>,
        existing: &[ExistingInterval],
        exclude: Option<PaymentId>,
    ) -> Result<PaymentDecision> {
        let selector = request.selector()?;
        let notes = self.config.normalize_notes(request.notes.as_deref())?;

        let selector = selector.load(|id| {
            let promotion = promotion
                .filter(|p| p.id == id)
                .cloned()
                .ok_or(BillingError::PromotionNotFound { id })?;
            check_eligibility(&promotion, payment_date)?;
            Ok(promotion)
        })?;

        let resolution = resolve(payment_date, request.period, &selector, &self.config)?;
        let interval = resolution.interval()?;

        debug!(
            client_id = %request.client_id,
            coverage = ?resolution.coverage,
            amount = %resolution.amount,
            interval = %interval,
            "period resolved"
        );

        validate_no_overlap(existing, &interval, exclude)?;

        Ok(PaymentDecision::from_resolution(request.client_id, resolution, notes))
    }

    /// load what the request needs from `store` and decide it.
    ///
    /// nothing is written; callers serialize per client around this and the
    /// following insert.
    pub fn resolve_and_validate_payment<S: PaymentStore + ?Sized>(
        &self,
        store: &S,
        request: &PaymentRequest,
        today: NaiveDate,
    ) -> Result<PaymentDecision> {
        if store.find_client(request.client_id)?.is_none() {
            return Err(BillingError::ClientNotFound {
                id: request.client_id,
            });
        }

        let payment_date = request.payment_date.unwrap_or(today);

        // input shape errors win over lookups
        let selector = request.selector()?;
        let promotion = match selector.promotion_id() {
            Some(id) => Some(
                store
                    .get_promotion(id)?
                    .ok_or(BillingError::PromotionNotFound { id })?,
            ),
            None => None,
        };

        let existing = store.list_active_intervals_for_client(request.client_id)?;
        self.decide(request, payment_date, promotion.as_ref(), &existing, None)
    }
}
