/// quick start - record a monthly payment, renew it, and try an overlapping one
use gym_billing::chrono::{NaiveDate, TimeZone, Utc};
use gym_billing::{
    BillingService, Client, EngineConfig, InMemoryStore, Money, PaymentPeriod, PaymentRequest,
    PaymentStore, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap(),
    ));

    let store = InMemoryStore::new();
    let client = Client::new("Amal Ben Salah", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    let client_id = client.id;
    store.insert_client(client)?;

    let service = BillingService::new(store, EngineConfig::default())?;

    // jan 31 + 1 month lands on feb 29
    let first = service.create_payment(
        &PaymentRequest::new(client_id)
            .period(PaymentPeriod::Monthly)
            .amount(Money::from_major(45)),
        &time,
    )?;
    println!("covered {} -> {}", first.payment_date, first.next_payment_date);

    // renewal on the boundary date is accepted
    let renewal = service.create_payment(
        &PaymentRequest::new(client_id)
            .on(first.next_payment_date)
            .period(PaymentPeriod::Quarterly)
            .amount(Money::from_major(120)),
        &time,
    )?;
    println!("renewed {} -> {}", renewal.payment_date, renewal.next_payment_date);

    // anything inside existing coverage is refused
    let clash = service.create_payment(
        &PaymentRequest::new(client_id)
            .on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .day_pass()
            .amount(Money::from_major(5)),
        &time,
    );
    if let Err(err) = clash {
        println!("rejected ({}): {}", err.kind().http_status(), err);
    }

    println!("{}", service.receipt(renewal.id, &time)?.json());
    println!(
        "client period now {:?}",
        service.store().find_client(client_id)?.and_then(|c| c.subscription_period)
    );

    Ok(())
}
