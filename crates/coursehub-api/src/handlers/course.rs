//! Course listing handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, CourseResponse};
use crate::state::AppState;

/// GET /api/courses
pub async fn list_courses(State(state): State<AppState>) -> Json<ApiResponse<Vec<CourseResponse>>> {
    let courses = state.realtime.courses.snapshot().await;
    let mut items = Vec::with_capacity(courses.len());
    for course in courses {
        let definition = course.definition();
        items.push(CourseResponse {
            id: course.id(),
            title: definition.title.clone(),
            course_type: definition.course_type.clone(),
            teacher: definition.teacher.clone(),
            location: definition.location.clone(),
            max: course.max(),
            selected: course.selected().await,
        });
    }
    Json(ApiResponse::ok(items))
}
