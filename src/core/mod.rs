//! Core business logic abstractions

pub mod calendar;
pub mod config;
pub mod log;
pub mod nav;
pub mod plan;
pub mod schedule;
pub mod transaction;

// Re-export main types for cleaner imports
pub use calendar::TradingCalendar;
pub use nav::{NavProvider, NavQuote};
pub use plan::{Frequency, Plan};
pub use schedule::{ScheduledBuy, generate_schedule, merge_schedules};
pub use transaction::{
    AUTO_INVEST_TAG, NewTransaction, PENDING_MARKER, Pricing, Transaction, TransactionType,
    plan_note_tag,
};
