use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::PaymentStore;
use crate::errors::{BillingError, Result};
use crate::promotions::Promotion;
use crate::types::{Client, ClientId, Payment, PaymentId, PaymentPeriod, PromotionId};

/// in-memory adapter, for tests and single-process deployments.
/// nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    clients: RwLock<HashMap<ClientId, Client>>,
    promotions: RwLock<HashMap<PromotionId, Promotion>>,
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_client(&self, client: Client) -> Result<()> {
        self.clients
            .write()
            .map_err(poisoned)?
            .insert(client.id, client);
        Ok(())
    }

    /// insert or replace, deleted promotions included
    pub fn save_promotion(&self, promotion: Promotion) -> Result<()> {
        self.promotions
            .write()
            .map_err(poisoned)?
            .insert(promotion.id, promotion);
        Ok(())
    }

    /// every payment for a client including soft-deleted ones
    pub fn payment_history(&self, client_id: ClientId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.payment_date, p.created_at));
        Ok(payments)
    }
}

impl PaymentStore for InMemoryStore {
    fn find_client(&self, id: ClientId) -> Result<Option<Client>> {
        Ok(self.clients.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn get_promotion(&self, id: PromotionId) -> Result<Option<Promotion>> {
        Ok(self
            .promotions
            .read()
            .map_err(poisoned)?
            .get(&id)
            .filter(|p| !p.is_deleted())
            .cloned())
    }

    fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.payments.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn list_payments_for_client(&self, client_id: ClientId) -> Result<Vec<Payment>> {
        let mut payments = self.payment_history(client_id)?;
        payments.retain(|p| !p.is_deleted());
        Ok(payments)
    }

    fn create_payment(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self.payments.write().map_err(poisoned)?;
        if payments.contains_key(&payment.id) {
            return Err(BillingError::Storage {
                message: format!("payment {} already exists", payment.id),
            });
        }
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    fn update_payment(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self.payments.write().map_err(poisoned)?;
        match payments.get_mut(&payment.id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(payment)
            }
            None => Err(BillingError::PaymentNotFound { id: payment.id }),
        }
    }

    fn set_client_subscription_period(
        &self,
        client_id: ClientId,
        period: PaymentPeriod,
    ) -> Result<()> {
        let mut clients = self.clients.write().map_err(poisoned)?;
        let client = clients
            .get_mut(&client_id)
            .ok_or(BillingError::ClientNotFound { id: client_id })?;
        client.subscription_period = Some(period);
        Ok(())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> BillingError {
    BillingError::Storage {
        message: "store lock poisoned".to_string(),
    }
}
