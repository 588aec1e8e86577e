//! Commonly used items for convenient importing.
//!
//! ```
//! use flaw::prelude::*;
//!
//! fn might_fail() -> Result<(), Flaw> {
//!     std::fs::read("/nonexistent")
//!         .flaw_with("failed to read state file", dict! { "path" => "/nonexistent" })?;
//!     Ok(())
//! }
//! ```

pub use crate::{Dict, FieldValue, Flaw, ResultExt, dict};
