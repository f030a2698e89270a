//! Bulk source of course definitions.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::CourseDefinition;

/// Provides every course definition in one query.
#[async_trait]
pub trait CourseSource: Send + Sync {
    /// Fetch all course rows.
    async fn fetch_courses(&self) -> AppResult<Vec<CourseDefinition>>;
}
