//! Console Module
//!
//! Line-oriented front-end over a [`crate::CacheManager`]: one command per
//! line on input, one JSON reply per line on output.

pub mod command;
pub mod handlers;

pub use command::Command;
pub use handlers::{error_reply, execute};
