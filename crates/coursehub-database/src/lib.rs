//! # coursehub-database
//!
//! PostgreSQL connection management and the concrete implementations of the
//! collaborator traits from `coursehub-core`: course loading, session
//! lookup, and the transactional choice store. The [`memory`] module
//! provides in-process equivalents for tests and local runs.

pub mod connection;
pub mod memory;
pub mod repositories;

pub use connection::DatabasePool;
