//! Core type definitions used across the CourseHub workspace.

pub mod choice;
pub mod course;
pub mod id;
pub mod session;

pub use choice::Choice;
pub use course::CourseDefinition;
pub use id::*;
pub use session::AuthenticatedUser;
