//! Persisted course choice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CourseId, UserId};

/// A user's seat in a course. Unique per `(user_id, course_id)` in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// The user holding the seat.
    pub user_id: UserId,
    /// The course the seat belongs to.
    pub course_id: CourseId,
    /// When the choice was made.
    pub selected_at: DateTime<Utc>,
}

impl Choice {
    /// Create a choice stamped with the current time.
    pub fn now(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            user_id,
            course_id,
            selected_at: Utc::now(),
        }
    }
}
