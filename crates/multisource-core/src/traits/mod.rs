//! Core traits for the multisource system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Source`]: Produce endpoints and notify about changes
//! - [`SourceFactory`]: Build sources from configuration

pub mod source;

pub use source::{EventHandler, Source, SourceFactory};
