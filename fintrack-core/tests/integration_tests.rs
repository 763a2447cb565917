//! Integration tests for fintrack-core services
//!
//! These tests verify the account and transaction flows using real DuckDB.
//! Email delivery and time are doubled at the trait level, but all
//! database operations are real.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use fintrack_core::adapters::memory::{FixedClock, MockNotifier};
use fintrack_core::adapters::DuckDbRepository;
use fintrack_core::domain::result::Error;
use fintrack_core::domain::{NewTransaction, NewUser, TransactionKind};
use fintrack_core::ports::UserStore;
use fintrack_core::services::{
    AuthService, DashboardService, OtpService, TransactionService,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestEnv {
    repo: Arc<DuckDbRepository>,
    notifier: Arc<MockNotifier>,
    clock: Arc<FixedClock>,
    auth: AuthService,
    otp: OtpService,
    transactions: TransactionService,
    dashboard: DashboardService,
}

/// Wire every service against one fresh DuckDB file
fn create_test_env(temp_dir: &TempDir) -> TestEnv {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = Arc::new(DuckDbRepository::new(&db_path).expect("Failed to create repository"));
    repo.ensure_schema().expect("Failed to initialize schema");

    let notifier = Arc::new(MockNotifier::new());
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));

    let auth = AuthService::new(
        repo.clone(),
        clock.clone(),
        "test-secret".to_string(),
        3600,
    );
    let otp = OtpService::new(
        repo.clone(),
        notifier.clone(),
        clock.clone(),
        "test-secret".to_string(),
        3600,
        600,
        5,
    );
    let transactions = TransactionService::new(repo.clone(), clock.clone());
    let dashboard = DashboardService::new(repo.clone(), clock.clone());

    TestEnv {
        repo,
        notifier,
        clock,
        auth,
        otp,
        transactions,
        dashboard,
    }
}

fn registration(email: &str) -> NewUser {
    NewUser {
        full_name: "Test User".to_string(),
        email: email.to_string(),
        password: "a-long-password".to_string(),
        profile_image_url: None,
    }
}

fn tx_input(label: &str, amount: i64, date: NaiveDate) -> NewTransaction {
    NewTransaction {
        label: label.to_string(),
        amount: Decimal::new(amount, 2),
        date,
        icon: None,
    }
}

// ============================================================================
// Registration and Verification Flow
// ============================================================================

/// Full happy path: register, receive a code, verify, then log in
#[tokio::test]
async fn test_register_verify_login_flow() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);

    let profile = env.auth.register(registration("ada@example.com")).await.unwrap();
    env.otp.issue(profile.id).await.unwrap();

    // Unverified accounts cannot log in yet
    assert!(matches!(
        env.auth.login("ada@example.com", "a-long-password").await,
        Err(Error::Unverified)
    ));

    // The emailed code verifies the account and issues a first session
    let sent = env.notifier.sent();
    assert_eq!(sent.len(), 1);
    let code = extract_code(&sent[0].body);

    env.clock.advance(Duration::minutes(5));
    let verified = env.otp.verify(profile.id, &code).await.unwrap();
    assert!(!verified.token.is_empty());

    // Now login works and returns the profile
    let login = env.auth.login("ada@example.com", "a-long-password").await.unwrap();
    assert_eq!(login.user.email, "ada@example.com");
    assert!(login.user.verified);
}

/// A code can only ever be consumed once, even straight from the database
#[tokio::test]
async fn test_otp_is_one_shot_in_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);

    let profile = env.auth.register(registration("ada@example.com")).await.unwrap();
    let expiry = env.clock.now() + Duration::minutes(10);
    env.repo.set_otp(profile.id, "482913", expiry).await.unwrap();

    // First consume wins, second finds nothing to clear
    assert!(env.repo.verify_and_clear_otp(profile.id, "482913").await.unwrap());
    assert!(!env.repo.verify_and_clear_otp(profile.id, "482913").await.unwrap());

    let user = env.repo.get_user(profile.id).await.unwrap().unwrap();
    assert!(user.verified);
    assert!(user.otp_code.is_none());
    assert!(user.otp_expiry.is_none());
}

/// Wrong-code guard never consumes, and never verifies the account
#[tokio::test]
async fn test_store_guard_rejects_wrong_code() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);

    let profile = env.auth.register(registration("ada@example.com")).await.unwrap();
    let expiry = env.clock.now() + Duration::minutes(10);
    env.repo.set_otp(profile.id, "482913", expiry).await.unwrap();

    assert!(!env.repo.verify_and_clear_otp(profile.id, "000000").await.unwrap());

    let user = env.repo.get_user(profile.id).await.unwrap().unwrap();
    assert!(!user.verified);
    assert_eq!(user.otp_code.as_deref(), Some("482913"));
}

/// Expired codes fail and are consumed by the failure
#[tokio::test]
async fn test_expired_code_through_service() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);

    let profile = env.auth.register(registration("ada@example.com")).await.unwrap();
    env.otp.issue(profile.id).await.unwrap();
    let code = extract_code(&env.notifier.sent()[0].body);

    env.clock.advance(Duration::minutes(11));
    assert!(matches!(
        env.otp.verify(profile.id, &code).await,
        Err(Error::Expired)
    ));
    assert!(matches!(
        env.otp.verify(profile.id, &code).await,
        Err(Error::Mismatch)
    ));
}

/// Re-issuing replaces the previous challenge
#[tokio::test]
async fn test_reissue_replaces_challenge() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);

    let profile = env.auth.register(registration("ada@example.com")).await.unwrap();
    env.otp.issue(profile.id).await.unwrap();
    let first = extract_code(&env.notifier.sent()[0].body);

    env.otp.issue(profile.id).await.unwrap();
    let second = extract_code(&env.notifier.sent()[1].body);

    if first != second {
        assert!(matches!(
            env.otp.verify(profile.id, &first).await,
            Err(Error::Mismatch)
        ));
    }
    assert!(env.otp.verify(profile.id, &second).await.is_ok());
}

// ============================================================================
// Transactions and Dashboard
// ============================================================================

#[tokio::test]
async fn test_transaction_crud_and_ownership() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);

    let owner = env.auth.register(registration("owner@example.com")).await.unwrap();
    let other = env.auth.register(registration("other@example.com")).await.unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
    let tx = env
        .transactions
        .add(owner.id, TransactionKind::Expense, tx_input("Rent", 120000, date))
        .await
        .unwrap();

    // Listings are per user and per kind
    assert_eq!(
        env.transactions.list(owner.id, TransactionKind::Expense).await.unwrap().len(),
        1
    );
    assert!(env
        .transactions
        .list(other.id, TransactionKind::Expense)
        .await
        .unwrap()
        .is_empty());

    // A stranger cannot delete someone else's record
    assert!(matches!(
        env.transactions.delete(other.id, tx.id).await,
        Err(Error::NotFound(_))
    ));
    env.transactions.delete(owner.id, tx.id).await.unwrap();
    assert!(matches!(
        env.transactions.delete(owner.id, tx.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_dashboard_summary_over_seeded_data() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);
    let user = env.auth.register(registration("ada@example.com")).await.unwrap();

    // Reference date is 2025-06-01 (fixed clock)
    let today = env.clock_date();
    let in_window = today - Duration::days(10);
    let out_of_30 = today - Duration::days(45);
    let out_of_60 = today - Duration::days(70);

    env.transactions
        .add(user.id, TransactionKind::Income, tx_input("Salary", 500000, in_window))
        .await
        .unwrap();
    env.transactions
        .add(user.id, TransactionKind::Income, tx_input("Old bonus", 100000, out_of_60))
        .await
        .unwrap();
    env.transactions
        .add(user.id, TransactionKind::Expense, tx_input("Groceries", 20000, in_window))
        .await
        .unwrap();
    env.transactions
        .add(user.id, TransactionKind::Expense, tx_input("Old rent", 120000, out_of_30))
        .await
        .unwrap();

    let summary = env.dashboard.summary(user.id).await.unwrap();

    // Totals cover everything regardless of window
    assert_eq!(summary.total_income, Decimal::new(600000, 2));
    assert_eq!(summary.total_expense, Decimal::new(140000, 2));
    assert_eq!(summary.total_balance, Decimal::new(460000, 2));

    // Windows clip to 30/60 days
    assert_eq!(summary.last30_days_expenses.transactions.len(), 1);
    assert_eq!(summary.last30_days_expenses.total, Decimal::new(20000, 2));
    assert_eq!(summary.last60_days_income.transactions.len(), 1);
    assert_eq!(summary.last60_days_income.total, Decimal::new(500000, 2));

    // Recent merges both kinds, most recent first
    assert_eq!(summary.recent_transactions.len(), 4);
    assert_eq!(summary.recent_transactions[0].date, in_window);
}

#[tokio::test]
async fn test_csv_export_round_trips_stored_records() {
    let temp_dir = TempDir::new().unwrap();
    let env = create_test_env(&temp_dir);
    let user = env.auth.register(registration("ada@example.com")).await.unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
    env.transactions
        .add(user.id, TransactionKind::Expense, tx_input("Coffee, beans", 1250, date))
        .await
        .unwrap();

    let bytes = env
        .transactions
        .export_csv(user.id, TransactionKind::Expense)
        .await
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.starts_with("Category,Amount,Date"));
    // The comma in the label is quoted, not split
    assert!(text.contains("\"Coffee, beans\",12.50,2025-05-03"));
}

// ============================================================================
// Schema
// ============================================================================

/// Reopening the same database applies no migrations twice
#[tokio::test]
async fn test_schema_is_idempotent_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.duckdb");

    {
        let repo = DuckDbRepository::new(&db_path).unwrap();
        repo.ensure_schema().unwrap();
    }

    let repo = DuckDbRepository::new(&db_path).unwrap();
    repo.ensure_schema().unwrap();
}

// ============================================================================
// Helpers
// ============================================================================

impl TestEnv {
    fn clock_date(&self) -> NaiveDate {
        use fintrack_core::ports::Clock;
        self.clock.now().date_naive()
    }
}

/// Pull the 6-digit code out of a delivery body
fn extract_code(body: &str) -> String {
    body.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_ascii_digit()))
        .find(|word| word.len() == 6 && word.chars().all(|c| c.is_ascii_digit()))
        .expect("email contains a 6-digit code")
        .to_string()
}
