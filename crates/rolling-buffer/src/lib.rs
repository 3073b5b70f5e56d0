//! Rolling History Buffer
//!
//! Provides a fixed-capacity FIFO buffer for recent sensor samples.

mod buffer;

pub use buffer::{RollingBuffer, DEFAULT_CAPACITY};
