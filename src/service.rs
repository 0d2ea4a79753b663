//! billing service: the read, validate, write sequence around the engine.
//!
//! Two requests for the same client could both pass the overlap check against
//! the same snapshot and both commit. The service holds a per-client mutex
//! from the interval read to the insert, so those requests run one after the
//! other. Different clients never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::{PaymentDecision, PaymentEngine, PaymentRequest};
use crate::errors::{BillingError, Result};
use crate::events::{Event, EventStore};
use crate::overlap::{validate_no_overlap, PaymentInterval};
use crate::periods::coverage_end;
use crate::serialization::ReceiptView;
use crate::status::ClientStanding;
use crate::store::PaymentStore;
use crate::types::{ClientId, Payment, PaymentId};

pub struct BillingService<S: PaymentStore> {
    store: S,
    engine: PaymentEngine,
    client_locks: Mutex<HashMap<ClientId, Arc<Mutex<()>>>>,
    history: Mutex<EventStore>,
}

impl<S: PaymentStore> BillingService<S> {
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            engine: PaymentEngine::new(config),
            client_locks: Mutex::new(HashMap::new()),
            history: Mutex::new(EventStore::new()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &PaymentEngine {
        &self.engine
    }

    /// decide without writing anything
    pub fn preview_payment(
        &self,
        request: &PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentDecision> {
        let today = time_provider.now().date_naive();
        self.engine
            .resolve_and_validate_payment(&self.store, request, today)
    }

    /// validate and persist a new payment
    pub fn create_payment(
        &self,
        request: &PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let now = time_provider.now();

        // unknown clients never get a lock entry
        if self.store.find_client(request.client_id)?.is_none() {
            let err = BillingError::ClientNotFound {
                id: request.client_id,
            };
            return self.reject(request, err, now);
        }

        let lock = self.client_lock(request.client_id)?;
        let _guard = lock.lock().map_err(poisoned)?;

        let decision = match self
            .engine
            .resolve_and_validate_payment(&self.store, request, now.date_naive())
        {
            Ok(decision) => decision,
            Err(err) => return self.reject(request, err, now),
        };

        let payment = self.store.create_payment(Payment {
            id: Uuid::new_v4(),
            client_id: decision.client_id,
            promotion_id: decision.promotion_id,
            amount: decision.amount,
            payment_date: decision.payment_date,
            next_payment_date: decision.next_payment_date,
            subscription_period: decision.period_label,
            coverage: decision.coverage,
            notes: decision.notes,
            created_at: now,
            deleted_at: None,
        })?;

        info!(
            payment_id = %payment.id,
            client_id = %payment.client_id,
            amount = %payment.amount,
            from = %payment.payment_date,
            until = %payment.next_payment_date,
            "payment created"
        );

        // the payment is committed from here on; history failures only warn
        self.record_committed(Event::PaymentCreated {
            payment_id: payment.id,
            client_id: payment.client_id,
            amount: payment.amount,
            payment_date: payment.payment_date,
            next_payment_date: payment.next_payment_date,
            coverage: payment.coverage,
            timestamp: now,
        });
        if let Some(promotion_id) = payment.promotion_id {
            self.record_committed(Event::PromotionApplied {
                payment_id: payment.id,
                promotion_id,
                price: payment.amount,
                timestamp: now,
            });
        }

        // projection only; a failure here does not undo the payment
        match self
            .store
            .set_client_subscription_period(payment.client_id, payment.subscription_period)
        {
            Ok(()) => self.record_committed(Event::ClientPeriodProjected {
                client_id: payment.client_id,
                period: payment.subscription_period,
                timestamp: now,
            }),
            Err(err) => warn!(
                client_id = %payment.client_id,
                error = %err,
                "client subscription period not updated"
            ),
        }

        Ok(payment)
    }

    /// move a payment to a new start date, keeping its coverage and amount.
    /// the new interval is checked against the client's other payments.
    pub fn reschedule_payment(
        &self,
        payment_id: PaymentId,
        new_payment_date: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let now = time_provider.now();
        let current = self.active_payment(payment_id)?;
        let lock = self.client_lock(current.client_id)?;
        let _guard = lock.lock().map_err(poisoned)?;

        // re-read under the lock
        let current = self.active_payment(payment_id)?;
        let next_payment_date = coverage_end(new_payment_date, &current.coverage)?;
        let interval = PaymentInterval::new(new_payment_date, next_payment_date)?;

        let existing = self.store.list_active_intervals_for_client(current.client_id)?;
        if let Err(err) = validate_no_overlap(&existing, &interval, Some(payment_id)) {
            warn!(payment_id = %payment_id, error = %err, "reschedule rejected");
            return Err(err);
        }

        let updated = self.store.update_payment(Payment {
            payment_date: new_payment_date,
            next_payment_date,
            ..current.clone()
        })?;

        info!(payment_id = %payment_id, interval = %interval, "payment rescheduled");
        self.record_committed(Event::PaymentRescheduled {
            payment_id,
            old_payment_date: current.payment_date,
            old_next_payment_date: current.next_payment_date,
            new_payment_date,
            new_next_payment_date: next_payment_date,
            timestamp: now,
        });

        Ok(updated)
    }

    /// soft delete; the payment's interval is released for new payments
    pub fn delete_payment(
        &self,
        payment_id: PaymentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let now = time_provider.now();
        let current = self.active_payment(payment_id)?;
        let lock = self.client_lock(current.client_id)?;
        let _guard = lock.lock().map_err(poisoned)?;

        let current = self.active_payment(payment_id)?;
        let deleted = self.store.update_payment(Payment {
            deleted_at: Some(now),
            ..current
        })?;

        info!(payment_id = %payment_id, amount = %deleted.amount, "payment deleted");
        self.record_committed(Event::PaymentDeleted {
            payment_id,
            amount: deleted.amount,
            timestamp: now,
        });

        Ok(deleted)
    }

    pub fn client_standing(
        &self,
        client_id: ClientId,
        time_provider: &SafeTimeProvider,
    ) -> Result<ClientStanding> {
        if self.store.find_client(client_id)?.is_none() {
            return Err(BillingError::ClientNotFound { id: client_id });
        }
        let payments = self.store.list_payments_for_client(client_id)?;
        Ok(ClientStanding::from_payments(
            &payments,
            time_provider.now().date_naive(),
        ))
    }

    pub fn receipt(
        &self,
        payment_id: PaymentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReceiptView> {
        let payment = self
            .store
            .get_payment(payment_id)?
            .ok_or(BillingError::PaymentNotFound { id: payment_id })?;
        let client = self
            .store
            .find_client(payment.client_id)?
            .ok_or(BillingError::ClientNotFound { id: payment.client_id })?;
        let promotion = match payment.promotion_id {
            Some(id) => self.store.get_promotion(id)?,
            None => None,
        };

        Ok(ReceiptView::from_payment(
            &payment,
            &client,
            promotion.as_ref(),
            &self.engine.config,
            time_provider.now().date_naive(),
        ))
    }

    /// drain recorded history
    pub fn take_events(&self) -> Result<Vec<Event>> {
        Ok(self.history()?.take_events())
    }

    /// history of one payment, oldest first
    pub fn payment_history(&self, payment_id: PaymentId) -> Result<Vec<Event>> {
        Ok(self
            .history()?
            .for_payment(payment_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn active_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        let payment = self
            .store
            .get_payment(payment_id)?
            .ok_or(BillingError::PaymentNotFound { id: payment_id })?;
        if payment.is_deleted() {
            return Err(BillingError::PaymentAlreadyDeleted { id: payment_id });
        }
        Ok(payment)
    }

    fn client_lock(&self, client_id: ClientId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.client_locks.lock().map_err(poisoned)?;
        Ok(locks.entry(client_id).or_default().clone())
    }

    fn history(&self) -> Result<MutexGuard<'_, EventStore>> {
        self.history.lock().map_err(poisoned)
    }

    fn record(&self, event: Event) -> Result<()> {
        self.history()?.emit(event);
        Ok(())
    }

    /// record an event for a write that already happened
    fn record_committed(&self, event: Event) {
        if let Err(err) = self.record(event) {
            warn!(error = %err, "event not recorded");
        }
    }

    fn reject<T>(
        &self,
        request: &PaymentRequest,
        err: BillingError,
        now: DateTime<Utc>,
    ) -> Result<T> {
        warn!(client_id = %request.client_id, error = %err, "payment rejected");
        self.record(Event::PaymentRejected {
            client_id: request.client_id,
            reason: err.to_string(),
            conflicting_payment: match &err {
                BillingError::OverlapConflict { payment_id, .. } => Some(*payment_id),
                _ => None,
            },
            timestamp: now,
        })?;
        Err(err)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> BillingError {
    BillingError::Storage {
        message: "billing lock poisoned".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::promotions::tests::draft;
    use crate::promotions::Promotion;
    use crate::status::ClientStatus;
    use crate::store::InMemoryStore;
    use crate::types::{Client, Coverage, PaymentPeriod};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn clock(y: i32, m: u32, day: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, day, 10, 0, 0).unwrap(),
        ))
    }

    fn setup() -> (BillingService<InMemoryStore>, ClientId) {
        let store = InMemoryStore::new();
        let client = Client::new("Yasmine Gharbi", d(2024, 1, 1));
        let client_id = client.id;
        store.insert_client(client).unwrap();
        let service = BillingService::new(store, EngineConfig::default()).unwrap();
        (service, client_id)
    }

    fn monthly(client_id: ClientId, date: NaiveDate) -> PaymentRequest {
        PaymentRequest::new(client_id)
            .on(date)
            .period(PaymentPeriod::Monthly)
            .amount(Money::from_major(40))
    }

    #[test]
    fn test_create_then_renew_on_boundary() {
        let (service, client_id) = setup();
        let time = clock(2024, 1, 1);

        let jan = service.create_payment(&monthly(client_id, d(2024, 1, 1)), &time).unwrap();
        assert_eq!(jan.next_payment_date, d(2024, 2, 1));

        let feb = service.create_payment(&monthly(client_id, d(2024, 2, 1)), &time).unwrap();
        assert_eq!(feb.next_payment_date, d(2024, 3, 1));

        let err = service
            .create_payment(&monthly(client_id, d(2024, 1, 15)), &time)
            .unwrap_err();
        assert_eq!(
            err,
            BillingError::OverlapConflict {
                payment_id: jan.id,
                start: d(2024, 1, 1),
                end: d(2024, 2, 1),
            }
        );
        assert_eq!(service.store().list_payments_for_client(client_id).unwrap().len(), 2);
    }

    #[test]
    fn test_payment_date_defaults_to_today() {
        let (service, client_id) = setup();
        let request = PaymentRequest::new(client_id)
            .day_pass()
            .amount(Money::from_major(5));

        let payment = service.create_payment(&request, &clock(2024, 3, 10)).unwrap();
        assert_eq!(payment.payment_date, d(2024, 3, 10));
        assert_eq!(payment.next_payment_date, d(2024, 3, 11));
        assert_eq!(payment.coverage, Coverage::DayPass);
    }

    #[test]
    fn test_other_clients_may_share_dates() {
        let (service, client_id) = setup();
        let other = Client::new("Karim Jaziri", d(2024, 1, 1));
        let other_id = other.id;
        service.store().insert_client(other).unwrap();
        let time = clock(2024, 1, 1);

        service.create_payment(&monthly(client_id, d(2024, 1, 1)), &time).unwrap();
        assert!(service.create_payment(&monthly(other_id, d(2024, 1, 1)), &time).is_ok());
    }

    #[test]
    fn test_promotion_payment_updates_projection_and_history() {
        let (service, client_id) = setup();
        let promo = Promotion::create(draft(100, Some(4))).unwrap();
        service.store().save_promotion(promo.clone()).unwrap();

        let request = PaymentRequest::new(client_id)
            .on(d(2024, 1, 31))
            .period(PaymentPeriod::Annual)
            .amount(Money::from_major(1))
            .promotion(promo.id);
        let payment = service.create_payment(&request, &clock(2024, 1, 31)).unwrap();

        assert_eq!(payment.amount, Money::from_major(100));
        assert_eq!(payment.next_payment_date, d(2024, 5, 31));
        assert_eq!(
            service.store().find_client(client_id).unwrap().unwrap().subscription_period,
            Some(PaymentPeriod::Annual)
        );

        let history = service.payment_history(payment.id).unwrap();
        assert!(matches!(history[0], Event::PaymentCreated { .. }));
        assert!(matches!(history[1], Event::PromotionApplied { .. }));
    }

    #[test]
    fn test_rejection_is_recorded() {
        let (service, client_id) = setup();
        let time = clock(2024, 1, 1);
        let first = service.create_payment(&monthly(client_id, d(2024, 1, 1)), &time).unwrap();
        service.take_events().unwrap();

        assert!(service.create_payment(&monthly(client_id, d(2024, 1, 10)), &time).is_err());

        let events = service.take_events().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::PaymentRejected { conflicting_payment, .. } => {
                assert_eq!(*conflicting_payment, Some(first.id))
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_client_takes_no_lock() {
        let (service, _) = setup();
        let time = clock(2024, 1, 1);
        let stranger = Uuid::new_v4();

        let err = service
            .create_payment(&monthly(stranger, d(2024, 1, 1)), &time)
            .unwrap_err();
        assert_eq!(err, BillingError::ClientNotFound { id: stranger });
        assert!(service.client_locks.lock().unwrap().is_empty());

        let events = service.take_events().unwrap();
        assert!(matches!(events[..], [Event::PaymentRejected { .. }]));
    }

    #[test]
    fn test_committed_payment_survives_history_failure() {
        let (service, client_id) = setup();
        let time = clock(2024, 1, 1);

        // poison the history lock
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _history = service.history.lock().unwrap();
                    panic!("history writer crashed");
                })
                .join();
        });
        assert!(service.take_events().is_err());

        let payment = service.create_payment(&monthly(client_id, d(2024, 1, 1)), &time).unwrap();
        assert_eq!(
            service.store().get_payment(payment.id).unwrap().unwrap().next_payment_date,
            d(2024, 2, 1)
        );
    }

    #[test]
    fn test_delete_frees_interval() {
        let (service, client_id) = setup();
        let time = clock(2024, 1, 1);
        let jan = service.create_payment(&monthly(client_id, d(2024, 1, 1)), &time).unwrap();

        let deleted = service.delete_payment(jan.id, &time).unwrap();
        assert!(deleted.is_deleted());
        assert_eq!(
            service.delete_payment(jan.id, &time).unwrap_err(),
            BillingError::PaymentAlreadyDeleted { id: jan.id }
        );

        assert!(service.create_payment(&monthly(client_id, d(2024, 1, 15)), &time).is_ok());
    }

    #[test]
    fn test_reschedule_revalidates_against_siblings() {
        let (service, client_id) = setup();
        let time = clock(2024, 1, 1);
        let jan = service.create_payment(&monthly(client_id, d(2024, 1, 1)), &time).unwrap();
        let mar = service.create_payment(&monthly(client_id, d(2024, 3, 1)), &time).unwrap();

        // sliding within its own old interval is fine
        let moved = service.reschedule_payment(jan.id, d(2024, 1, 20), &time).unwrap();
        assert_eq!(moved.next_payment_date, d(2024, 2, 20));

        // but not into march's coverage
        let err = service.reschedule_payment(jan.id, d(2024, 2, 15), &time).unwrap_err();
        assert_eq!(
            err,
            BillingError::OverlapConflict {
                payment_id: mar.id,
                start: d(2024, 3, 1),
                end: d(2024, 4, 1),
            }
        );

        let stored = service.store().get_payment(jan.id).unwrap().unwrap();
        assert_eq!(stored.payment_date, d(2024, 1, 20));
    }

    #[test]
    fn test_standing_follows_payments() {
        let (service, client_id) = setup();
        assert_eq!(
            service.client_standing(client_id, &clock(2024, 1, 1)).unwrap().status,
            ClientStatus::Unpaid
        );

        service
            .create_payment(&monthly(client_id, d(2024, 1, 1)), &clock(2024, 1, 1))
            .unwrap();

        let mid = service.client_standing(client_id, &clock(2024, 1, 20)).unwrap();
        assert_eq!(mid.status, ClientStatus::UpToDate);
        assert!(mid.new_this_month);

        let after = service.client_standing(client_id, &clock(2024, 2, 1)).unwrap();
        assert_eq!(after.status, ClientStatus::Late);
    }

    #[test]
    fn test_receipt_for_day_pass() {
        let (service, client_id) = setup();
        let request = PaymentRequest::new(client_id)
            .on(d(2024, 3, 10))
            .day_pass()
            .amount(Money::from_major(5))
            .notes(" walk-in ");
        let payment = service.create_payment(&request, &clock(2024, 3, 10)).unwrap();

        let receipt = service.receipt(payment.id, &clock(2024, 3, 10)).unwrap();
        assert_eq!(receipt.coverage, "Day pass");
        assert_eq!(receipt.notes.as_deref(), Some("walk-in"));
        assert_eq!(receipt.client.full_name, "Yasmine Gharbi");
        assert!(receipt.valid);

        assert!(matches!(
            service.receipt(Uuid::new_v4(), &clock(2024, 3, 10)),
            Err(BillingError::PaymentNotFound { .. })
        ));
    }

    #[test]
    fn test_concurrent_requests_for_one_client() {
        let (service, client_id) = setup();

        let results: Vec<Result<Payment>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let service = &service;
                    scope.spawn(move || {
                        let time = clock(2024, 1, 1);
                        service.create_payment(&monthly(client_id, d(2024, 1, 1 + i)), &time)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, BillingError::OverlapConflict { .. })));
        assert_eq!(
            service.store().list_active_intervals_for_client(client_id).unwrap().len(),
            1
        );
    }
}
