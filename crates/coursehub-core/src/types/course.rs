//! Static course definition as loaded from the course table.

use serde::{Deserialize, Serialize};

use super::id::CourseId;

/// The immutable part of a course, as returned by a
/// [`CourseSource`](crate::traits::CourseSource).
///
/// The live `selected` counter is not part of the definition; it only exists
/// in the in-memory registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourseDefinition {
    /// Unique course identifier.
    pub id: CourseId,
    /// Maximum number of seats.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "nmax"))]
    pub max: i32,
    /// Display title.
    pub title: String,
    /// Course category (e.g. `Sport`, `Enrichment`, `Culture`).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ctype"))]
    pub course_type: String,
    /// Teacher in charge.
    pub teacher: String,
    /// Where the course takes place.
    pub location: String,
}

impl CourseDefinition {
    /// Seat capacity clamped to a non-negative count.
    pub fn capacity(&self) -> u32 {
        u32::try_from(self.max).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(max: i32) -> CourseDefinition {
        CourseDefinition {
            id: CourseId(1),
            max,
            title: "Football".into(),
            course_type: "Sport".into(),
            teacher: "Ms. Lee".into(),
            location: "Field".into(),
        }
    }

    #[test]
    fn test_capacity_clamps_negative() {
        assert_eq!(definition(20).capacity(), 20);
        assert_eq!(definition(-3).capacity(), 0);
    }
}
