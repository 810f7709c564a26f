//! Output formatting module
//!
//! Progress markers and diagnostic reports.

mod formatter;

pub use formatter::{OutputFormat, Reporter};
