//! Course repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use coursehub_core::error::{AppError, ErrorKind};
use coursehub_core::result::AppResult;
use coursehub_core::traits::CourseSource;
use coursehub_core::types::{CourseDefinition, CourseId};

/// Repository for course definitions.
#[derive(Debug, Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    /// Create a new course repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every course.
    pub async fn find_all(&self) -> AppResult<Vec<CourseDefinition>> {
        sqlx::query_as::<_, CourseDefinition>(
            "SELECT id, nmax, title, ctype, teacher, location FROM courses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Error fetching courses", e))
    }

    /// Count persisted choices per course.
    ///
    /// Not consulted on reload yet; see `CourseRegistry::reload`.
    pub async fn count_choices(&self) -> AppResult<Vec<(CourseId, i64)>> {
        sqlx::query_as::<_, (CourseId, i64)>(
            "SELECT courseid, COUNT(*) FROM choices GROUP BY courseid ORDER BY courseid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Error counting choices", e))
    }
}

#[async_trait]
impl CourseSource for CourseRepository {
    async fn fetch_courses(&self) -> AppResult<Vec<CourseDefinition>> {
        self.find_all().await
    }
}
