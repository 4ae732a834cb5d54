//! Output formatters for scan results.
//!
//! # Example
//!
//! ```no_run
//! use memescanner::duplicates::DuplicateFinder;
//! use memescanner::output::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let outcome = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! JsonOutput::new(&outcome).write_file(Path::new("results.json")).unwrap();
//! ```

pub mod json;

pub use json::{JsonOutput, JsonOutputError, JsonRecord};
