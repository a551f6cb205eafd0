//! Advisory clinical insight for oncology patients.
//!
//! This crate builds a summary prompt from a patient snapshot and sends it to
//! a text-generation provider. Insight text is never persisted and is not
//! required for the rest of the system to work.

pub mod insight;
pub mod prompts;
pub mod snapshot;

#[cfg(feature = "remote")]
pub mod gemini;

pub use insight::*;
pub use prompts::*;
pub use snapshot::*;
