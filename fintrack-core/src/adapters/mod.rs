//! Adapter implementations of the ports
//!
//! Concrete integrations: DuckDB persistence, the HTTP mail relay, and
//! in-memory doubles for tests.

pub mod duckdb;
pub mod mailer;
pub mod memory;

pub use duckdb::DuckDbRepository;
pub use mailer::{HttpMailer, NoopMailer};
