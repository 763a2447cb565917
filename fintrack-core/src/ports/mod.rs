//! Port definitions for external dependencies
//!
//! Traits the services depend on; adapters provide the implementations.

mod clock;
mod notifier;
mod repository;

pub use clock::{Clock, SystemClock};
pub use notifier::Notifier;
pub use repository::{TransactionStore, UserStore};
