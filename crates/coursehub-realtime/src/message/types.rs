//! Messages the server sends to clients.

use std::fmt;

use coursehub_core::types::CourseId;

/// A server → client message.
///
/// Encoded field values are server-controlled and never need escaping;
/// free text always travels in the trailing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Reply to `HELLO`.
    Hi,
    /// The seat is held (fresh or repeated request). Echoes the course
    /// argument as the client sent it.
    Accepted {
        /// Course argument from the request.
        course: String,
    },
    /// The seat request was refused.
    Rejected {
        /// Course argument from the request.
        course: String,
        /// Human-readable reason.
        reason: String,
    },
    /// Broadcast: a course's selected count changed.
    CourseCount {
        /// The course whose count changed.
        course_id: CourseId,
        /// The count after the change.
        selected: u32,
    },
    /// Fatal error; the connection is closed after this message.
    Error {
        /// Human-readable reason.
        reason: String,
    },
    /// The connection presented no valid credential.
    Unauthenticated,
}

impl ServerMessage {
    /// Rejection of a request for a full course.
    pub fn full(course: impl Into<String>) -> Self {
        Self::Rejected {
            course: course.into(),
            reason: "Full".to_string(),
        }
    }

    /// Fatal error carrying `reason`.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
        }
    }

    /// Encode into the wire representation.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hi => f.write_str("HI"),
            Self::Accepted { course } => write!(f, "Y {course}"),
            Self::Rejected { course, reason } => write!(f, "R {course} :{reason}"),
            Self::CourseCount {
                course_id,
                selected,
            } => write!(f, "N {course_id} {selected}"),
            Self::Error { reason } => write!(f, "E :{reason}"),
            Self::Unauthenticated => f.write_str("U"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageCodec;

    #[test]
    fn test_encode_shapes() {
        assert_eq!(ServerMessage::Hi.encode(), "HI");
        assert_eq!(
            ServerMessage::Accepted {
                course: "12".into()
            }
            .encode(),
            "Y 12"
        );
        assert_eq!(ServerMessage::full("12").encode(), "R 12 :Full");
        assert_eq!(
            ServerMessage::CourseCount {
                course_id: CourseId(12),
                selected: 3
            }
            .encode(),
            "N 12 3"
        );
        assert_eq!(
            ServerMessage::error("Unknown command Z").encode(),
            "E :Unknown command Z"
        );
        assert_eq!(ServerMessage::Unauthenticated.encode(), "U");
    }

    #[test]
    fn test_error_reason_survives_decoding() {
        let encoded = ServerMessage::error("Course ID must be an integer").encode();
        let fields = MessageCodec::default().decode(encoded.as_bytes());
        assert_eq!(fields, ["E", "Course ID must be an integer"]);
    }
}
