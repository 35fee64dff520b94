//! Set-associative cache simulator driven by `valgrind --tool=lackey` style
//! memory traces. Only tags are tracked, no data is stored.

pub mod cache;
pub mod config;
pub mod error;
pub mod replace;
pub mod sim;
pub mod stats;
pub mod trace;

pub use error::Error;
