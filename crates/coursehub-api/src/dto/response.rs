//! Response DTOs.

use serde::{Deserialize, Serialize};

use coursehub_core::types::CourseId;

/// Standard success wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the handler answers.
    pub status: String,
    /// Server version.
    pub version: String,
    /// `"connected"`, or `"disabled"` on in-memory stores.
    pub database: String,
    /// Sessions registered for broadcasts.
    pub sessions: usize,
    /// Courses loaded in the registry.
    pub courses: usize,
}

/// One course with its live seat count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    /// Course ID.
    pub id: CourseId,
    /// Title.
    pub title: String,
    /// Category.
    #[serde(rename = "type")]
    pub course_type: String,
    /// Teacher.
    pub teacher: String,
    /// Location.
    pub location: String,
    /// Seat capacity.
    pub max: u32,
    /// Seats taken.
    pub selected: u32,
}
