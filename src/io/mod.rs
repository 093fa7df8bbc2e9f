//! Input/output helpers.
//!
//! - sample ingest from text lines (`ingest`)
//! - JSON export of fit records (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
