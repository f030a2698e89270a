//! In-memory course registry.
//!
//! Records are stored behind `Arc` so a record, and with it its seat lock,
//! keeps its identity for as long as anyone holds it, even across a reload
//! that replaces the map.

pub mod course;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use coursehub_core::error::AppError;
use coursehub_core::result::AppResult;
use coursehub_core::traits::CourseSource;
use coursehub_core::types::CourseId;

pub use course::{CapacityExceeded, Course};

/// All courses, keyed by ID.
///
/// The coarse lock is only write-held for the instant the map is swapped;
/// lookups take the read side and never contend with seat updates, which
/// go through each record's own lock.
#[derive(Debug, Default)]
pub struct CourseRegistry {
    courses: RwLock<HashMap<CourseId, Arc<Course>>>,
    reload_guard: Mutex<()>,
}

impl CourseRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every record with fresh ones built from `source`.
    ///
    /// Returns the number of courses loaded. Fails with `SetupRace` if
    /// another reload is in progress, and with the source's error if the
    /// query fails; in both cases the current records stay in place.
    ///
    /// Seat counts start at zero: choices already persisted are not counted.
    pub async fn reload(&self, source: &dyn CourseSource) -> AppResult<usize> {
        let _reloading = self
            .reload_guard
            .try_lock()
            .map_err(|_| AppError::setup_race("Cannot reload courses: reload already running"))?;

        let definitions = source.fetch_courses().await?;
        let fresh: HashMap<CourseId, Arc<Course>> = definitions
            .into_iter()
            .map(|definition| (definition.id, Arc::new(Course::new(definition))))
            .collect();
        let count = fresh.len();

        let previous = std::mem::replace(&mut *self.courses.write().await, fresh);
        if !previous.is_empty() {
            warn!(
                previous = previous.len(),
                loaded = count,
                "Course registry replaced; live seat counts were reset"
            );
        }

        info!(courses = count, "Course registry loaded");
        Ok(count)
    }

    /// Looks up a course.
    pub async fn get(&self, id: CourseId) -> Option<Arc<Course>> {
        self.courses.read().await.get(&id).cloned()
    }

    /// All courses ordered by ID.
    pub async fn snapshot(&self) -> Vec<Arc<Course>> {
        let mut courses: Vec<_> = self.courses.read().await.values().cloned().collect();
        courses.sort_by_key(|c| c.id());
        courses
    }

    /// Number of loaded courses.
    pub async fn len(&self) -> usize {
        self.courses.read().await.len()
    }

    /// Returns `true` when no course is loaded.
    pub async fn is_empty(&self) -> bool {
        self.courses.read().await.is_empty()
    }
}
