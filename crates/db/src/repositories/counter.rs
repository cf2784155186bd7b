//! Per-key document sequences.
//!
//! A single `INSERT ... ON CONFLICT DO UPDATE ... RETURNING` both creates a
//! missing key and bumps an existing one, so concurrent callers on the same
//! key are serialized by the row lock Postgres takes on conflict. Called
//! inside a document transaction, the allocation rolls back with it.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    Statement, TransactionTrait,
};
use uuid::Uuid;

use pettycash_core::LedgerError;

use crate::entities::counters;

use super::{db_err, now};

const NEXT_VALUE_SQL: &str = r"
INSERT INTO counters (id, key_counter, counter_value, updated_at)
VALUES ($1, $2, 1, $3)
ON CONFLICT (key_counter)
DO UPDATE SET counter_value = counters.counter_value + 1, updated_at = EXCLUDED.updated_at
RETURNING counter_value
";

/// Allocates the next value for `key` on `conn` (usually an open transaction).
pub(crate) async fn next_value<C: ConnectionTrait>(conn: &C, key: &str) -> Result<i64, LedgerError> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        NEXT_VALUE_SQL,
        [
            Uuid::now_v7().into(),
            key.into(),
            now().into(),
        ],
    );

    let row = conn
        .query_one(stmt)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::Database(format!("counter upsert returned no row for {key}")))?;

    row.try_get::<i64>("", "counter_value").map_err(db_err)
}

/// Sequence counter repository.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    db: DatabaseConnection,
}

impl CounterRepository {
    /// Creates a new counter repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the next value for `key`: 1 for a new key, then 2, 3, ...
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Database` if the upsert fails.
    pub async fn get_and_increment(&self, key: &str) -> Result<i64, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let value = next_value(&txn, key).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(value)
    }

    /// Last value handed out for `key`, 0 if the key was never used.
    pub async fn peek(&self, key: &str) -> Result<i64, LedgerError> {
        let row = counters::Entity::find()
            .filter(counters::Column::KeyCounter.eq(key))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(row.map_or(0, |r| r.counter_value))
    }
}
