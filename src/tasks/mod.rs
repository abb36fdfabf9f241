//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::spawn_sweeper;
