//! Transaction service - income and expense records

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{NewTransaction, Transaction, TransactionKind};
use crate::ports::{Clock, TransactionStore};

/// Transaction service for the record write/read/export paths
///
/// All record validation happens here, before anything is stored; the
/// aggregator can assume every stored record is well formed.
pub struct TransactionService {
    store: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
}

impl TransactionService {
    pub fn new(store: Arc<dyn TransactionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validate and persist a new record
    pub async fn add(
        &self,
        user_id: Uuid,
        kind: TransactionKind,
        input: NewTransaction,
    ) -> Result<Transaction> {
        input.validate(kind)?;

        let mut tx = Transaction::new(
            Uuid::new_v4(),
            user_id,
            kind,
            input.amount,
            input.label.trim(),
            input.date,
            self.clock.now(),
        );
        tx.icon = input.icon.filter(|icon| !icon.trim().is_empty());

        self.store.add_transaction(&tx).await?;
        Ok(tx)
    }

    /// All of a user's records of one kind, most recent first
    pub async fn list(&self, user_id: Uuid, kind: TransactionKind) -> Result<Vec<Transaction>> {
        self.store.get_transactions(user_id, kind).await
    }

    /// Delete a record the user owns
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        if self.store.delete_transaction(user_id, id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("{} transaction", id)))
        }
    }

    /// Serialize a user's records of one kind to CSV for download
    pub async fn export_csv(&self, user_id: Uuid, kind: TransactionKind) -> Result<Vec<u8>> {
        let transactions = self.list(user_id, kind).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([capitalized(kind.label_field()), "Amount".into(), "Date".into()])
            .map_err(|e| Error::Other(format!("CSV export failed: {}", e)))?;
        for tx in &transactions {
            writer
                .write_record([
                    tx.label.clone(),
                    tx.amount.to_string(),
                    tx.date.format("%Y-%m-%d").to_string(),
                ])
                .map_err(|e| Error::Other(format!("CSV export failed: {}", e)))?;
        }

        writer
            .into_inner()
            .map_err(|e| Error::Other(format!("CSV export failed: {}", e)))
    }
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
