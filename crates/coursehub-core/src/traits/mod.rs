//! Collaborator traits defined in `coursehub-core` and implemented by
//! `coursehub-database` (PostgreSQL and in-memory backends).

pub mod authenticator;
pub mod choice_store;
pub mod course_source;

pub use authenticator::SessionAuthenticator;
pub use choice_store::{ChoiceStore, ChoiceTransaction, InsertOutcome};
pub use course_source::CourseSource;
