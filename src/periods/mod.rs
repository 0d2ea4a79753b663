pub mod resolver;
pub mod selector;

pub use resolver::{coverage_end, resolve, PeriodResolution};
pub use selector::PeriodSelector;
