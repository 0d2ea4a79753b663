//! storage port consumed by the billing service.
//!
//! The engine itself never touches storage; it is handed plain records. The
//! service reads through this trait, validates, then writes back through it.
//! One adapter ships with the crate ([`InMemoryStore`]); a database adapter
//! implements the same trait.

pub mod memory;

use crate::errors::Result;
use crate::overlap::ExistingInterval;
use crate::promotions::Promotion;
use crate::types::{Client, ClientId, Payment, PaymentId, PaymentPeriod, PromotionId};

pub use memory::InMemoryStore;

pub trait PaymentStore: Send + Sync {
    fn find_client(&self, id: ClientId) -> Result<Option<Client>>;

    /// soft-deleted promotions are not returned
    fn get_promotion(&self, id: PromotionId) -> Result<Option<Promotion>>;

    /// any payment, deleted or not
    fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    /// a client's non-deleted payments ordered by payment date
    fn list_payments_for_client(&self, client_id: ClientId) -> Result<Vec<Payment>>;

    fn create_payment(&self, payment: Payment) -> Result<Payment>;

    fn update_payment(&self, payment: Payment) -> Result<Payment>;

    fn set_client_subscription_period(&self, client_id: ClientId, period: PaymentPeriod)
        -> Result<()>;

    /// intervals of a client's non-deleted payments
    fn list_active_intervals_for_client(&self, client_id: ClientId) -> Result<Vec<ExistingInterval>> {
        self.list_payments_for_client(client_id)?
            .iter()
            .filter(|p| !p.is_deleted())
            .map(ExistingInterval::from_payment)
            .collect()
    }
}
