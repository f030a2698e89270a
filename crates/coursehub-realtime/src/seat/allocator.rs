//! Seat allocator: persists a choice and keeps the live counter in step.
//!
//! The persistent store is authoritative for *who* holds a seat and the
//! in-memory counter for *how many* seats are gone. A seat is only handed
//! out when both agree; a failed commit gives the counter back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use coursehub_core::error::AppError;
use coursehub_core::result::AppResult;
use coursehub_core::traits::{ChoiceStore, ChoiceTransaction, InsertOutcome};
use coursehub_core::types::{Choice, CourseId, UserId};

use crate::connection::BroadcastRegistry;
use crate::message::ServerMessage;
use crate::registry::{Course, CourseRegistry};

/// Result of a seat request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// A new seat was taken; `selected` is the count after the increment.
    Accepted {
        /// Seats taken in the course after this request.
        selected: u32,
    },
    /// The user already held this seat. Nothing changed.
    Reaffirmed,
    /// The course had no free seat. Nothing changed.
    Full,
}

impl Allocation {
    /// Returns `true` if the user holds the seat after the request.
    pub fn is_held(self) -> bool {
        !matches!(self, Self::Full)
    }
}

/// Runs the seat request protocol against the registry and the store.
#[derive(Clone)]
pub struct SeatAllocator {
    courses: Arc<CourseRegistry>,
    store: Arc<dyn ChoiceStore>,
    broadcast: Arc<BroadcastRegistry>,
}

impl std::fmt::Debug for SeatAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeatAllocator").finish_non_exhaustive()
    }
}

impl SeatAllocator {
    /// Creates an allocator over the given registry, store, and broadcast
    /// registry.
    pub fn new(
        courses: Arc<CourseRegistry>,
        store: Arc<dyn ChoiceStore>,
        broadcast: Arc<BroadcastRegistry>,
    ) -> Self {
        Self {
            courses,
            store,
            broadcast,
        }
    }

    /// Requests a seat in `course_id` for `user_id`.
    ///
    /// Errors are protocol errors (unknown course) or database errors; both
    /// end the requesting session.
    pub async fn choose(&self, user_id: &UserId, course_id: CourseId) -> AppResult<Allocation> {
        let course = self
            .courses
            .get(course_id)
            .await
            .ok_or_else(|| AppError::protocol(format!("No such course {course_id}")))?;

        let mut tx = self.store.begin().await?;
        let choice = Choice::now(user_id.clone(), course_id);

        match tx.insert_choice(&choice).await {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::Duplicate) => {
                tx.rollback().await?;
                debug!(user_id = %user_id, course_id = %course_id, "Seat already held");
                return Ok(Allocation::Reaffirmed);
            }
            Err(err) => {
                rollback_quietly(tx).await;
                return Err(err);
            }
        }

        let selected = match course.try_reserve().await {
            Ok(selected) => selected,
            Err(full) => {
                tx.rollback().await.map_err(|err| {
                    warn!(course_id = %full.course_id, error = %err, "Rollback after capacity check failed");
                    AppError::database(
                        "Database error while rolling back transaction due to course limit",
                    )
                })?;
                debug!(user_id = %user_id, course_id = %course_id, "Course full");
                return Ok(Allocation::Full);
            }
        };

        if let Err(err) = tx.commit().await {
            let corrected = course.release().await;
            warn!(
                user_id = %user_id,
                course_id = %course_id,
                selected = corrected,
                error = %err,
                "Commit failed; seat returned"
            );
            self.announce(&course).await;
            return Err(err);
        }

        info!(user_id = %user_id, course_id = %course_id, selected, "Seat taken");
        self.announce(&course).await;
        Ok(Allocation::Accepted { selected })
    }

    /// Queues the course's live count for every session.
    ///
    /// The count is re-read here rather than taken from the reservation, so
    /// a request that overtook this one is already reflected. Two announces
    /// can still leave out of order between the read and the fan-out; the
    /// course lock is not held across the fan-out.
    async fn announce(&self, course: &Course) {
        let selected = course.selected().await;
        // Best effort: sessions that miss a count are logged by the registry.
        let _ = self
            .broadcast
            .fan_out(&ServerMessage::CourseCount {
                course_id: course.id(),
                selected,
            })
            .await;
    }
}

async fn rollback_quietly(tx: Box<dyn ChoiceTransaction>) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "Rollback after failed insert also failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_core::error::ErrorKind;
    use coursehub_core::types::CourseDefinition;
    use coursehub_database::memory::{MemoryChoiceStore, MemoryCourseSource};
    use uuid::Uuid;

    struct Fixture {
        allocator: SeatAllocator,
        courses: Arc<CourseRegistry>,
        store: MemoryChoiceStore,
        broadcast: Arc<BroadcastRegistry>,
    }

    async fn fixture(courses: &[(i64, i32)], queue_capacity: usize) -> Fixture {
        let definitions = courses
            .iter()
            .map(|&(id, max)| CourseDefinition {
                id: CourseId(id),
                max,
                title: format!("Course {id}"),
                course_type: "Sport".into(),
                teacher: "Coach".into(),
                location: "Gym".into(),
            })
            .collect();
        let registry = Arc::new(CourseRegistry::new());
        registry
            .reload(&MemoryCourseSource::new(definitions))
            .await
            .unwrap();

        let store = MemoryChoiceStore::new();
        let broadcast = Arc::new(BroadcastRegistry::new(queue_capacity));
        let allocator = SeatAllocator::new(
            registry.clone(),
            Arc::new(store.clone()),
            broadcast.clone(),
        );
        Fixture {
            allocator,
            courses: registry,
            store,
            broadcast,
        }
    }

    async fn selected(fx: &Fixture, id: i64) -> u32 {
        fx.courses.get(CourseId(id)).await.unwrap().selected().await
    }

    #[tokio::test]
    async fn test_accept_then_reaffirm() {
        let fx = fixture(&[(1, 5)], 8).await;
        let mut watcher = fx.broadcast.register("watcher".into(), Uuid::new_v4()).await;
        let alice = UserId::new("alice");

        let first = fx.allocator.choose(&alice, CourseId(1)).await.unwrap();
        assert_eq!(first, Allocation::Accepted { selected: 1 });
        assert_eq!(watcher.recv().await.as_deref(), Some("N 1 1"));

        let again = fx.allocator.choose(&alice, CourseId(1)).await.unwrap();
        assert_eq!(again, Allocation::Reaffirmed);
        assert!(again.is_held());
        assert_eq!(selected(&fx, 1).await, 1);
        assert_eq!(fx.store.count_for(CourseId(1)), 1);
        assert!(watcher.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_course_rolls_back() {
        let fx = fixture(&[(2, 1)], 8).await;
        fx.allocator
            .choose(&UserId::new("alice"), CourseId(2))
            .await
            .unwrap();

        let bob = UserId::new("bob");
        let outcome = fx.allocator.choose(&bob, CourseId(2)).await.unwrap();
        assert_eq!(outcome, Allocation::Full);
        assert!(!outcome.is_held());
        assert!(!fx.store.contains(&bob, CourseId(2)));
        assert_eq!(selected(&fx, 2).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_course_is_protocol_error() {
        let fx = fixture(&[(1, 5)], 8).await;
        let err = fx
            .allocator
            .choose(&UserId::new("alice"), CourseId(99))
            .await
            .expect_err("unknown course");
        assert_eq!(err.kind, ErrorKind::Protocol);
        assert_eq!(err.message, "No such course 99");
    }

    #[tokio::test]
    async fn test_begin_failure_leaves_counter() {
        let fx = fixture(&[(1, 5)], 8).await;
        fx.store.set_fail_begin(true);
        let err = fx
            .allocator
            .choose(&UserId::new("alice"), CourseId(1))
            .await
            .expect_err("begin fails");
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(selected(&fx, 1).await, 0);
    }

    #[tokio::test]
    async fn test_commit_failure_compensates() {
        let fx = fixture(&[(3, 2)], 8).await;
        let alice = UserId::new("alice");
        fx.allocator.choose(&alice, CourseId(3)).await.unwrap();

        let mut watcher = fx.broadcast.register("watcher".into(), Uuid::new_v4()).await;
        fx.store.fail_next_commit();
        let bob = UserId::new("bob");
        let err = fx
            .allocator
            .choose(&bob, CourseId(3))
            .await
            .expect_err("commit fails");
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(selected(&fx, 3).await, 1);
        assert!(!fx.store.contains(&bob, CourseId(3)));
        assert_eq!(watcher.recv().await.as_deref(), Some("N 3 1"));

        // The freed seat can be taken again.
        let retry = fx.allocator.choose(&bob, CourseId(3)).await.unwrap();
        assert_eq!(retry, Allocation::Accepted { selected: 2 });
    }

    #[tokio::test]
    async fn test_full_queue_does_not_fail_allocation() {
        let fx = fixture(&[(1, 10)], 1).await;
        let mut stalled = fx.broadcast.register("stalled".into(), Uuid::new_v4()).await;

        for (n, user) in ["a", "b", "c"].into_iter().enumerate() {
            let outcome = fx
                .allocator
                .choose(&UserId::new(user), CourseId(1))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                Allocation::Accepted {
                    selected: n as u32 + 1
                }
            );
        }
        assert_eq!(stalled.recv().await.as_deref(), Some("N 1 1"));
        assert!(stalled.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pending_claim_rolled_back_is_not_reaffirmed() {
        let fx = fixture(&[(4, 0)], 8).await;
        let alice = UserId::new("alice");
        let mut open = fx.store.begin().await.unwrap();
        open.insert_choice(&Choice::now(alice.clone(), CourseId(4)))
            .await
            .unwrap();

        let second = tokio::spawn({
            let allocator = fx.allocator.clone();
            let alice = alice.clone();
            async move { allocator.choose(&alice, CourseId(4)).await }
        });
        while fx.store.waiting_on(&alice, CourseId(4)) == 0 {
            tokio::task::yield_now().await;
        }
        open.rollback().await.unwrap();

        assert_eq!(second.await.unwrap().unwrap(), Allocation::Full);
        assert!(!fx.store.contains(&alice, CourseId(4)));
        assert_eq!(selected(&fx, 4).await, 0);
    }

    #[tokio::test]
    async fn test_pending_claim_committed_is_reaffirmed() {
        let fx = fixture(&[(4, 1)], 8).await;
        let alice = UserId::new("alice");
        let mut open = fx.store.begin().await.unwrap();
        open.insert_choice(&Choice::now(alice.clone(), CourseId(4)))
            .await
            .unwrap();

        let second = tokio::spawn({
            let allocator = fx.allocator.clone();
            let alice = alice.clone();
            async move { allocator.choose(&alice, CourseId(4)).await }
        });
        while fx.store.waiting_on(&alice, CourseId(4)) == 0 {
            tokio::task::yield_now().await;
        }
        open.commit().await.unwrap();

        assert_eq!(second.await.unwrap().unwrap(), Allocation::Reaffirmed);
        assert_eq!(fx.store.count_for(CourseId(4)), 1);
    }

    #[tokio::test]
    async fn test_announce_sends_live_count() {
        let fx = fixture(&[(6, 5)], 8).await;
        let mut watcher = fx.broadcast.register("watcher".into(), Uuid::new_v4()).await;
        let course = fx.courses.get(CourseId(6)).await.unwrap();

        // Seats taken outside this request still show in the next announce.
        course.try_reserve().await.unwrap();
        course.try_reserve().await.unwrap();
        fx.allocator.announce(&course).await;
        assert_eq!(watcher.recv().await.as_deref(), Some("N 6 2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_announces_end_at_final_count() {
        const REQUESTS: usize = 30;

        let fx = fixture(&[(6, REQUESTS as i32)], 64).await;
        let mut watcher = fx.broadcast.register("watcher".into(), Uuid::new_v4()).await;
        let handles: Vec<_> = (0..REQUESTS)
            .map(|i| {
                let allocator = fx.allocator.clone();
                tokio::spawn(async move {
                    allocator
                        .choose(&UserId::new(format!("user-{i}")), CourseId(6))
                        .await
                })
            })
            .collect();
        let mut reserved = Vec::new();
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Allocation::Accepted { selected } => reserved.push(selected),
                other => panic!("unexpected {other:?}"),
            }
        }
        reserved.sort_unstable();
        assert_eq!(reserved, (1..=REQUESTS as u32).collect::<Vec<_>>());

        let mut announced = Vec::new();
        while let Ok(text) = watcher.try_recv() {
            let count: u32 = text.rsplit(' ').next().unwrap().parse().unwrap();
            announced.push(count);
        }
        assert_eq!(announced.len(), REQUESTS);
        assert_eq!(announced.iter().max(), Some(&(REQUESTS as u32)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_fill_exactly_to_capacity() {
        const REQUESTS: usize = 40;
        const MAX: i32 = 15;

        let fx = fixture(&[(5, MAX)], 64).await;
        let handles: Vec<_> = (0..REQUESTS)
            .map(|i| {
                let allocator = fx.allocator.clone();
                tokio::spawn(async move {
                    allocator
                        .choose(&UserId::new(format!("user-{i}")), CourseId(5))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Allocation::Accepted { .. } => accepted += 1,
                Allocation::Full => full += 1,
                Allocation::Reaffirmed => panic!("distinct users never repeat"),
            }
        }
        assert_eq!(accepted, MAX as usize);
        assert_eq!(full, REQUESTS - MAX as usize);
        assert_eq!(selected(&fx, 5).await, MAX as u32);
        assert_eq!(fx.store.count_for(CourseId(5)), MAX as usize);
    }
}
