//! In-memory transactional choice store with fault injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use coursehub_core::error::AppError;
use coursehub_core::result::AppResult;
use coursehub_core::traits::{ChoiceStore, ChoiceTransaction, InsertOutcome};
use coursehub_core::types::{Choice, CourseId, UserId};

type ChoiceKey = (UserId, CourseId);

#[derive(Debug, Default)]
struct InnerState {
    /// Rows visible to everyone.
    committed: HashMap<ChoiceKey, Choice>,
    /// Keys claimed by open transactions. Removing an entry drops its sender,
    /// which wakes inserts of the same key waiting for the claim to end.
    pending: HashMap<ChoiceKey, watch::Sender<()>>,
}

/// [`ChoiceStore`] keeping rows in a mutex-protected map.
///
/// Failures of `begin` and `commit` can be injected to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryChoiceStore {
    state: Arc<Mutex<InnerState>>,
    fail_begin: Arc<AtomicBool>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryChoiceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `begin` fail until reset.
    pub fn set_fail_begin(&self, fail: bool) {
        self.fail_begin.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `commit` fail; its writes are discarded.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Returns whether `user_id` holds a committed seat in `course_id`.
    pub fn contains(&self, user_id: &UserId, course_id: CourseId) -> bool {
        self.lock()
            .committed
            .contains_key(&(user_id.clone(), course_id))
    }

    /// Number of committed choices for `course_id`.
    pub fn count_for(&self, course_id: CourseId) -> usize {
        self.lock()
            .committed
            .keys()
            .filter(|(_, c)| *c == course_id)
            .count()
    }

    /// Number of inserts blocked on another transaction's claim of the key.
    pub fn waiting_on(&self, user_id: &UserId, course_id: CourseId) -> usize {
        self.lock()
            .pending
            .get(&(user_id.clone(), course_id))
            .map_or(0, watch::Sender::receiver_count)
    }

    fn lock(&self) -> MutexGuard<'_, InnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChoiceStore for MemoryChoiceStore {
    async fn begin(&self) -> AppResult<Box<dyn ChoiceTransaction>> {
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(AppError::database(
                "Database error while beginning transaction",
            ));
        }
        Ok(Box::new(MemoryChoiceTransaction {
            store: self.clone(),
            staged: None,
        }))
    }
}

/// An open in-memory transaction holding at most one staged row.
#[derive(Debug)]
struct MemoryChoiceTransaction {
    store: MemoryChoiceStore,
    staged: Option<Choice>,
}

impl MemoryChoiceTransaction {
    fn has_staged(&self, key: &ChoiceKey) -> bool {
        self.staged
            .as_ref()
            .is_some_and(|c| c.user_id == key.0 && c.course_id == key.1)
    }

    fn release_claim(&mut self) {
        if let Some(choice) = self.staged.take() {
            self.store
                .lock()
                .pending
                .remove(&(choice.user_id, choice.course_id));
        }
    }
}

#[async_trait]
impl ChoiceTransaction for MemoryChoiceTransaction {
    /// Behaves like an insert against a unique index: a key claimed by
    /// another open transaction blocks until that transaction ends, and is a
    /// duplicate only if it committed.
    async fn insert_choice(&mut self, choice: &Choice) -> AppResult<InsertOutcome> {
        let key = (choice.user_id.clone(), choice.course_id);
        loop {
            let mut claim = {
                let mut state = self.store.lock();
                if state.committed.contains_key(&key) || self.has_staged(&key) {
                    return Ok(InsertOutcome::Duplicate);
                }
                match state.pending.get(&key) {
                    Some(owner) => owner.subscribe(),
                    None => {
                        if let Some(previous) = self.staged.take() {
                            state.pending.remove(&(previous.user_id, previous.course_id));
                        }
                        let (owner, _) = watch::channel(());
                        state.pending.insert(key.clone(), owner);
                        self.staged = Some(choice.clone());
                        return Ok(InsertOutcome::Inserted);
                    }
                }
            };
            debug!(user_id = %choice.user_id, course_id = %choice.course_id, "Waiting on concurrent claim");
            // Errors once the owning transaction drops the sender.
            let _ = claim.changed().await;
        }
    }

    async fn commit(mut self: Box<Self>) -> AppResult<()> {
        if self.store.fail_next_commit.swap(false, Ordering::SeqCst) {
            self.release_claim();
            return Err(AppError::database(
                "Database error while committing transaction",
            ));
        }
        if let Some(choice) = self.staged.take() {
            let key = (choice.user_id.clone(), choice.course_id);
            let mut state = self.store.lock();
            state.pending.remove(&key);
            debug!(user_id = %choice.user_id, course_id = %choice.course_id, "Choice committed");
            state.committed.insert(key, choice);
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> AppResult<()> {
        self.release_claim();
        Ok(())
    }
}

impl Drop for MemoryChoiceTransaction {
    fn drop(&mut self) {
        self.release_claim();
    }
}
