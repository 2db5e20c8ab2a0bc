// # Source Implementations
//
// This module provides built-in implementations of the Source trait for
// in-process and file-backed endpoints, plus the polling helper sources use
// to turn "backend changed" into event-handler calls.

pub mod file;
pub mod memory;
pub mod poller;

pub use file::{FileSource, FileSourceFactory};
pub use memory::{MemorySource, MemorySourceFactory};
pub use poller::spawn_change_poller;
