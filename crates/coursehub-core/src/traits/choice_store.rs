//! Transactional store for course choices.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Choice;

/// Result of inserting a choice inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was inserted and will be persisted on commit.
    Inserted,
    /// The `(user, course)` pair already exists; the store's uniqueness
    /// constraint rejected the row.
    Duplicate,
}

/// Opens transactions against the persistent choice store.
#[async_trait]
pub trait ChoiceStore: Send + Sync + 'static {
    /// Begin a new transaction.
    async fn begin(&self) -> AppResult<Box<dyn ChoiceTransaction>>;
}

/// A single open transaction.
///
/// Dropping a transaction without calling [`commit`](Self::commit) must
/// discard its writes.
#[async_trait]
pub trait ChoiceTransaction: Send {
    /// Insert a choice row, distinguishing a uniqueness violation from
    /// other failures.
    async fn insert_choice(&mut self, choice: &Choice) -> AppResult<InsertOutcome>;

    /// Commit the transaction.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Roll the transaction back.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
