//! A single course and its live seat counter.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use coursehub_core::types::{CourseDefinition, CourseId};

/// The course has no free seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("course {course_id} is full")]
pub struct CapacityExceeded {
    /// The full course.
    pub course_id: CourseId,
}

/// A course record owned by the [`CourseRegistry`](super::CourseRegistry).
///
/// Descriptive fields are immutable. `selected` is only ever read or changed
/// under the record's own lock, which keeps `0 <= selected <= max`.
#[derive(Debug)]
pub struct Course {
    definition: CourseDefinition,
    max: u32,
    selected: Mutex<u32>,
}

impl Course {
    /// Creates a record with no seats taken.
    pub fn new(definition: CourseDefinition) -> Self {
        Self {
            max: definition.capacity(),
            definition,
            selected: Mutex::new(0),
        }
    }

    /// Course identifier.
    pub fn id(&self) -> CourseId {
        self.definition.id
    }

    /// Seat capacity.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// The static definition this record was built from.
    pub fn definition(&self) -> &CourseDefinition {
        &self.definition
    }

    /// Current number of seats taken.
    pub async fn selected(&self) -> u32 {
        *self.selected.lock().await
    }

    /// Takes one seat if any is free and returns the new count.
    pub async fn try_reserve(&self) -> Result<u32, CapacityExceeded> {
        let mut selected = self.selected.lock().await;
        if *selected >= self.max {
            return Err(CapacityExceeded {
                course_id: self.id(),
            });
        }
        *selected += 1;
        Ok(*selected)
    }

    /// Gives one seat back and returns the new count.
    ///
    /// Only used to compensate a reservation whose commit failed, so the
    /// counter is expected to be positive.
    pub async fn release(&self) -> u32 {
        let mut selected = self.selected.lock().await;
        match selected.checked_sub(1) {
            Some(n) => *selected = n,
            None => warn!(course_id = %self.id(), "Released a seat of a course with none taken"),
        }
        *selected
    }
}
