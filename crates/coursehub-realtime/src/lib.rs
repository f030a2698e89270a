//! # coursehub-realtime
//!
//! Real-time engine for CourseHub. Provides:
//!
//! - the space-separated wire codec and the server message shapes
//! - the in-memory course registry with per-course seat locks
//! - the broadcast registry fanning count updates out to every session
//! - the transactional seat allocator
//! - the per-connection session state machine

pub mod connection;
pub mod message;
pub mod registry;
pub mod seat;
pub mod server;
pub mod session;

pub use connection::broadcast::BroadcastRegistry;
pub use registry::CourseRegistry;
pub use seat::allocator::SeatAllocator;
pub use server::RealtimeEngine;
