//! Transactional choice store on PostgreSQL.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use coursehub_core::error::{AppError, ErrorKind};
use coursehub_core::result::AppResult;
use coursehub_core::traits::{ChoiceStore, ChoiceTransaction, InsertOutcome};
use coursehub_core::types::Choice;

/// [`ChoiceStore`] backed by the `choices` table.
///
/// Duplicate detection relies on the table's `UNIQUE (userid, courseid)`
/// constraint.
#[derive(Debug, Clone)]
pub struct PgChoiceStore {
    pool: PgPool,
}

impl PgChoiceStore {
    /// Create a new choice store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChoiceStore for PgChoiceStore {
    async fn begin(&self) -> AppResult<Box<dyn ChoiceTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Database error while beginning transaction",
                e,
            )
        })?;
        Ok(Box::new(PgChoiceTransaction { tx }))
    }
}

/// An open PostgreSQL transaction. Rolled back by sqlx when dropped.
#[derive(Debug)]
pub struct PgChoiceTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ChoiceTransaction for PgChoiceTransaction {
    async fn insert_choice(&mut self, choice: &Choice) -> AppResult<InsertOutcome> {
        let result =
            sqlx::query("INSERT INTO choices (seltime, userid, courseid) VALUES ($1, $2, $3)")
                .bind(choice.selected_at.timestamp_micros())
                .bind(&choice.user_id)
                .bind(choice.course_id)
                .execute(&mut *self.tx)
                .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Database error while inserting course choice",
                e,
            )),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Database error while committing transaction",
                e,
            )
        })
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Database error while rolling back transaction",
                e,
            )
        })
    }
}
