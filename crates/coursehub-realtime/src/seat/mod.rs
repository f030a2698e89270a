//! Transactional seat allocation.

pub mod allocator;

pub use allocator::{Allocation, SeatAllocator};
