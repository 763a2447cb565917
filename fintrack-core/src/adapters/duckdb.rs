//! DuckDB repository implementation

use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Transaction, TransactionKind, User};
use crate::ports::{TransactionStore, UserStore};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Error::Database(e.to_string())
    }
}

/// DuckDB repository implementation
///
/// One connection behind a mutex; every statement runs while holding the
/// lock, which is what makes the OTP consume path atomic per process.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
}

impl DuckDbRepository {
    /// Open (or create) the database file
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which can occur when another process still holds the file
    /// (e.g., a restart racing the old instance's shutdown).
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            "database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("Failed to open database after {} retries", MAX_RETRIES)
        }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Disable extension autoloading to avoid macOS code signing issues
        // (cached extensions in ~/.duckdb/extensions may have different Team IDs)
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()?;
        Ok(())
    }
}

const USER_COLUMNS: &str = "user_id, email, password_hash, full_name, profile_image_url, \
     otp_code, otp_expiry, otp_attempts, verified, created_at, updated_at";

type UserRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    bool,
    String,
    String,
);

fn read_user_row(row: &duckdb::Row<'_>) -> duckdb::Result<UserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn user_from_row(row: UserRow) -> Result<User> {
    let (
        user_id,
        email,
        password_hash,
        full_name,
        profile_image_url,
        otp_code,
        otp_expiry,
        otp_attempts,
        verified,
        created_at,
        updated_at,
    ) = row;

    Ok(User {
        id: parse_uuid(&user_id)?,
        email,
        password_hash,
        full_name,
        profile_image_url,
        otp_code,
        otp_expiry: otp_expiry.as_deref().map(parse_timestamp).transpose()?,
        otp_attempts: otp_attempts as u32,
        verified,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "transaction_id, user_id, kind, amount, label, transaction_date, icon, created_at";

type TransactionRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
);

fn read_transaction_row(row: &duckdb::Row<'_>) -> duckdb::Result<TransactionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn transaction_from_row(row: TransactionRow) -> Result<Transaction> {
    let (transaction_id, user_id, kind, amount, label, transaction_date, icon, created_at) = row;

    Ok(Transaction {
        id: parse_uuid(&transaction_id)?,
        user_id: parse_uuid(&user_id)?,
        kind: TransactionKind::parse(&kind)?,
        amount: parse_amount(&amount)?,
        label,
        date: parse_date(&transaction_date)?,
        icon,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("bad uuid {:?}: {}", s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::database(format!("bad timestamp {:?}: {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::database(format!("bad date {:?}: {}", s, e)))
}

fn parse_amount(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| Error::database(format!("bad amount {:?}: {}", s, e)))
}

#[async_trait]
impl UserStore for DuckDbRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_users WHERE user_id = ?",
            USER_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id.to_string()], read_user_row)?;

        match rows.next() {
            Some(row) => Ok(Some(user_from_row(row?)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_users WHERE email = ?",
            USER_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![email], read_user_row)?;

        match rows.next() {
            Some(row) => Ok(Some(user_from_row(row?)?)),
            None => Ok(None),
        }
    }

    async fn add_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_users (user_id, email, password_hash, full_name, \
             profile_image_url, otp_code, otp_expiry, otp_attempts, verified, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.full_name,
                user.profile_image_url,
                user.otp_code,
                user.otp_expiry.map(|t| t.to_rfc3339()),
                user.otp_attempts as i64,
                user.verified,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn set_profile_image(&self, id: Uuid, url: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE sys_users SET profile_image_url = ?, updated_at = ? WHERE user_id = ?",
            params![url, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("user {}", id)));
        }
        Ok(())
    }

    async fn set_otp(&self, id: Uuid, code: &str, expiry: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE sys_users SET otp_code = ?, otp_expiry = ?, otp_attempts = 0, \
             updated_at = ? WHERE user_id = ?",
            params![
                code,
                expiry.to_rfc3339(),
                Utc::now().to_rfc3339(),
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("user {}", id)));
        }
        Ok(())
    }

    async fn clear_otp(&self, id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE sys_users SET otp_code = NULL, otp_expiry = NULL, otp_attempts = 0, \
             updated_at = ? WHERE user_id = ?",
            params![Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("user {}", id)));
        }
        Ok(())
    }

    async fn record_otp_failure(&self, id: Uuid) -> Result<u32> {
        // Increment and read back under one lock hold
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE sys_users SET otp_attempts = otp_attempts + 1, updated_at = ? \
             WHERE user_id = ?",
            params![Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("user {}", id)));
        }
        let attempts: i64 = conn.query_row(
            "SELECT otp_attempts FROM sys_users WHERE user_id = ?",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(attempts as u32)
    }

    async fn verify_and_clear_otp(&self, id: Uuid, code: &str) -> Result<bool> {
        // Compare-and-clear in a single statement: the guard on otp_code
        // means a code can only be consumed once even under concurrent
        // verify calls.
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE sys_users SET otp_code = NULL, otp_expiry = NULL, otp_attempts = 0, \
             verified = TRUE, updated_at = ? WHERE user_id = ? AND otp_code = ?",
            params![Utc::now().to_rfc3339(), id.to_string(), code],
        )?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl TransactionStore for DuckDbRepository {
    async fn add_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_transactions (transaction_id, user_id, kind, amount, label, \
             transaction_date, icon, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tx.id.to_string(),
                tx.user_id.to_string(),
                tx.kind.as_str(),
                tx.amount.to_string(),
                tx.label,
                tx.date.format("%Y-%m-%d").to_string(),
                tx.icon,
                tx.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn get_transactions(
        &self,
        user_id: Uuid,
        kind: TransactionKind,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_transactions WHERE user_id = ? AND kind = ? \
             ORDER BY transaction_date DESC, created_at DESC",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id.to_string(), kind.as_str()], read_transaction_row)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(transaction_from_row(row?)?);
        }
        Ok(transactions)
    }

    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM sys_transactions WHERE transaction_id = ? AND user_id = ?",
            params![id.to_string(), user_id.to_string()],
        )?;
        Ok(changed > 0)
    }
}
