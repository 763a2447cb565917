//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod result;
pub mod token;
mod transaction;
mod user;

pub use transaction::{NewTransaction, Transaction, TransactionKind};
pub use user::{normalize_email, validate_email, NewUser, User, UserProfile, MIN_PASSWORD_LEN};
