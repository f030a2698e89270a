//! # coursehub-core
//!
//! Core crate for CourseHub. Contains configuration schemas, typed
//! identifiers, the course and choice domain types, the collaborator traits
//! implemented by the persistence layer, and the unified error system.
//!
//! This crate has **no** internal dependencies on other CourseHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
