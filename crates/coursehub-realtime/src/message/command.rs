//! Commands clients send to the server.

use coursehub_core::error::AppError;
use coursehub_core::result::AppResult;
use coursehub_core::types::CourseId;

/// A validated client → server command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `HELLO`
    Hello,
    /// `Y <course id>`: request a seat.
    Choose {
        /// Parsed course identifier.
        course_id: CourseId,
        /// The argument exactly as sent, echoed back in replies.
        raw: String,
    },
    /// `N <x>`: well-formed but only meaningful server → client.
    CourseCount,
}

impl ClientCommand {
    /// Validates decoded fields. Any error is a protocol violation.
    pub fn parse(fields: &[String]) -> AppResult<Self> {
        let Some((name, args)) = fields.split_first() else {
            return Err(AppError::protocol("Empty message"));
        };

        match name.as_str() {
            "HELLO" => Ok(Self::Hello),
            "Y" => {
                let [raw] = args else {
                    return Err(AppError::protocol("Invalid number of arguments for Y"));
                };
                let course_id = raw
                    .parse::<CourseId>()
                    .map_err(|_| AppError::protocol("Course ID must be an integer"))?;
                Ok(Self::Choose {
                    course_id,
                    raw: raw.clone(),
                })
            }
            "N" => {
                if args.len() != 1 {
                    return Err(AppError::protocol("Invalid number of arguments for N"));
                }
                Ok(Self::CourseCount)
            }
            other => Err(AppError::protocol(format!("Unknown command {other}"))),
        }
    }
}
