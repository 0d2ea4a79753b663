pub mod calendar;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod overlap;
pub mod periods;
pub mod promotions;
pub mod serialization;
pub mod service;
pub mod status;
pub mod store;
pub mod types;

// re-export key types
pub use calendar::{add_days, add_months};
pub use config::EngineConfig;
pub use decimal::Money;
pub use engine::{PaymentDecision, PaymentEngine, PaymentRequest};
pub use errors::{BillingError, ErrorKind, Result};
pub use events::{Event, EventStore};
pub use overlap::{find_conflict, validate_no_overlap, ExistingInterval, PaymentInterval};
pub use periods::{resolve, PeriodResolution, PeriodSelector};
pub use promotions::{check_eligibility, is_eligible, Promotion, PromotionDraft};
pub use serialization::ReceiptView;
pub use service::BillingService;
pub use status::{ClientStanding, ClientStatus};
pub use store::{InMemoryStore, PaymentStore};
pub use types::{
    Client, ClientId, Coverage, Payment, PaymentId, PaymentPeriod, PromotionId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
