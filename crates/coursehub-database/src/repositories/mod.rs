//! PostgreSQL repository implementations of the core collaborator traits.

pub mod choice;
pub mod course;
pub mod user;

pub use choice::{PgChoiceStore, PgChoiceTransaction};
pub use course::CourseRepository;
pub use user::UserRepository;
