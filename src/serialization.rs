/// serialization support for payment receipts
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::promotions::Promotion;
use crate::types::{Client, ClientId, Payment, PaymentId, PaymentPeriod};

/// serializable view of a payment as printed on a receipt
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptView {
    pub payment_id: PaymentId,
    pub client: ClientView,
    pub amount: Money,
    pub currency: String,
    pub payment_date: NaiveDate,
    pub next_payment_date: NaiveDate,
    pub period_label: PaymentPeriod,
    pub coverage: String,
    pub promotion: Option<PromotionView>,
    pub notes: Option<String>,
    /// still running on the day the receipt was produced
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientView {
    pub id: ClientId,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromotionView {
    pub name: String,
    pub subscription_months: Option<u32>,
}

impl ReceiptView {
    pub fn from_payment(
        payment: &Payment,
        client: &Client,
        promotion: Option<&Promotion>,
        config: &EngineConfig,
        today: NaiveDate,
    ) -> Self {
        ReceiptView {
            payment_id: payment.id,
            client: ClientView {
                id: client.id,
                full_name: client.full_name.clone(),
            },
            amount: payment.amount,
            currency: config.currency.clone(),
            payment_date: payment.payment_date,
            next_payment_date: payment.next_payment_date,
            period_label: payment.subscription_period,
            coverage: payment.coverage.describe(),
            promotion: promotion
                .filter(|p| Some(p.id) == payment.promotion_id)
                .map(|p| PromotionView {
                    name: p.name.clone(),
                    subscription_months: p.months(),
                }),
            notes: payment.notes.clone(),
            valid: payment.is_valid_on(today),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn json(&self) -> String {
        self.to_json_pretty().unwrap_or_else(|_| "{}".to_string())
    }
}
