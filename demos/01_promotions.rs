/// promotions - fixed price and duration, eligibility windows
use gym_billing::chrono::{NaiveDate, TimeZone, Utc};
use gym_billing::{
    BillingService, Client, EngineConfig, InMemoryStore, Money, PaymentPeriod, PaymentRequest,
    Promotion, PromotionDraft, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    ));

    let store = InMemoryStore::new();
    let client = Client::new("Karim Jaziri", NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
    let client_id = client.id;
    store.insert_client(client)?;

    let summer = Promotion::create(PromotionDraft {
        name: "Summer 4 months".to_string(),
        notes: None,
        fixed_price: Money::from_major(150),
        subscription_months: Some(4),
        active: true,
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        end_date: NaiveDate::from_ymd_opt(2024, 8, 31),
    })?;
    store.save_promotion(summer.clone())?;

    let service = BillingService::new(store, EngineConfig::default())?;

    // the typed amount is replaced by the promotion price
    let payment = service.create_payment(
        &PaymentRequest::new(client_id)
            .period(PaymentPeriod::Monthly)
            .amount(Money::from_major(1))
            .promotion(summer.id),
        &time,
    )?;
    println!(
        "{} paid, covered {} -> {}",
        payment.amount, payment.payment_date, payment.next_payment_date
    );

    // outside the window the whole attempt is refused
    let late = service.preview_payment(
        &PaymentRequest::new(client_id)
            .on(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap())
            .promotion(summer.id),
        &time,
    );
    if let Err(err) = late {
        println!("rejected: {}", err);
    }

    for event in service.take_events()? {
        println!("{:?}", event);
    }

    Ok(())
}
