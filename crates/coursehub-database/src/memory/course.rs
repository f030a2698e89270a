//! Fixed list of course definitions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use coursehub_core::error::AppError;
use coursehub_core::result::AppResult;
use coursehub_core::traits::CourseSource;
use coursehub_core::types::CourseDefinition;

/// [`CourseSource`] serving a fixed list.
#[derive(Debug, Clone, Default)]
pub struct MemoryCourseSource {
    courses: Vec<CourseDefinition>,
    fail: bool,
    gate: Option<Arc<Notify>>,
    arrived: Option<Arc<Notify>>,
}

impl MemoryCourseSource {
    /// Serves `courses` on every fetch.
    pub fn new(courses: Vec<CourseDefinition>) -> Self {
        Self {
            courses,
            fail: false,
            gate: None,
            arrived: None,
        }
    }

    /// A source whose fetch always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Holds every fetch until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notifies `arrived` each time a fetch starts, before any gate.
    pub fn signal_arrival(mut self, arrived: Arc<Notify>) -> Self {
        self.arrived = Some(arrived);
        self
    }
}

#[async_trait]
impl CourseSource for MemoryCourseSource {
    async fn fetch_courses(&self) -> AppResult<Vec<CourseDefinition>> {
        if let Some(arrived) = &self.arrived {
            arrived.notify_one();
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(AppError::database("Error fetching courses"));
        }
        Ok(self.courses.clone())
    }
}
