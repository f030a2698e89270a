//! In-process backends for the core collaborator traits.
//!
//! Suitable for tests and single-node demos only; nothing is persisted.

pub mod auth;
pub mod choice;
pub mod course;

pub use auth::MemoryAuthenticator;
pub use choice::MemoryChoiceStore;
pub use course::MemoryCourseSource;
