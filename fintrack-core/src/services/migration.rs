//! Migration service - manages database schema migrations
//!
//! Migrations are SQL files embedded at compile time. Each migration is
//! tracked in the sys_migrations table to ensure idempotent execution.

use std::collections::HashSet;

use anyhow::Result;
use duckdb::Connection;

use crate::migrations::MIGRATIONS;

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Service for managing database migrations
pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    /// Create a new migration service with a database connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Run all pending migrations in order, recording each one
    pub fn run_pending(&self) -> Result<MigrationResult> {
        // The tracking table is itself the first migration; its SQL is
        // CREATE TABLE IF NOT EXISTS, so re-running it is harmless and
        // there is no separate bootstrap probe.
        let (bootstrap_name, bootstrap_sql) = MIGRATIONS[0];
        self.conn.execute_batch(bootstrap_sql)?;

        let mut applied_set: HashSet<String> = self.get_applied()?.into_iter().collect();
        let already_applied = applied_set.len();
        let mut newly_applied = Vec::new();

        if !applied_set.contains(bootstrap_name) {
            self.record_migration(bootstrap_name)?;
            newly_applied.push(bootstrap_name.to_string());
            applied_set.insert(bootstrap_name.to_string());
        }

        for (name, sql) in &MIGRATIONS[1..] {
            if !applied_set.contains(*name) {
                self.conn.execute_batch(sql)?;
                self.record_migration(name)?;
                newly_applied.push(name.to_string());
            }
        }

        Ok(MigrationResult {
            applied: newly_applied,
            already_applied,
        })
    }

    /// Get list of already applied migration names
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for name in names {
            result.push(name?);
        }
        Ok(result)
    }

    /// Record a migration as applied
    fn record_migration(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [name],
        )?;
        Ok(())
    }
}
