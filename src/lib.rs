#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! A structured error-enrichment library.
//!
//! ## Overview
//!
//! This crate provides an error value, the [`Flaw`], that accumulates
//! ordered contextual records and a captured call-stack trace as it
//! propagates up a call chain, and serializes itself deterministically to
//! a JSON object for diagnostics and logging.
//!
//! Unlike plain string-based errors, a [`Flaw`] keeps track of which
//! function added which data before re-raising: every annotation is an
//! ordered [`Record`] tagged with the producing function's identity, the
//! stack trace is captured exactly once at the true origin of the failure,
//! and secondary failures observed while handling the primary one can be
//! joined without replacing it. The serialized form is machine-parsable
//! without any runtime reflection at the logging call site.
//!
//! ## Quick Example
//!
//! ```
//! use flaw::prelude::*;
//!
//! fn insert_key(key: &str) -> Result<(), Flaw> {
//!     if key == "bad-key" {
//!         let failure = std::io::Error::other("attempt to insert a bad key");
//!         return Err(Flaw::from_error(failure).append([dict! { "key" => key }]));
//!     }
//!     Ok(())
//! }
//!
//! fn create_user(id: &str, age: u8) -> Result<(), Flaw> {
//!     insert_key("bad-key").flaw_with(
//!         "failed to create user",
//!         dict! { "id" => id, "age" => age },
//!     )
//! }
//!
//! let flaw = create_user("a", 42).unwrap_err();
//! assert_eq!(flaw.records().len(), 2);
//! println!("{flaw}"); // the full serialized JSON form
//! ```
//!
//! ## Core Concepts
//!
//! A [`Flaw`] owns four things:
//!
//! - An **inner message**: the description supplied when the error chain
//!   began. It is never re-derived later.
//! - **Records**: an ordered list of contextual contributions, one per
//!   annotation, each built through a forward-only, append-only payload
//!   encoder ([`Dict`]) with typed setters for every supported value kind.
//! - A **stack trace**: captured exactly once, when a new flaw is created
//!   from a plain failure, so the trace stays pinned to the origin rather
//!   than each intermediate annotation point.
//! - **Joined errors**: secondary failures (say, a cleanup failure inside
//!   an error path) recorded alongside the primary failure.
//!
//! Flaws propagate through ordinary `Result` channels; the
//! [`ResultExt`] extension trait and the [`wrap`](Flaw::wrap) operation
//! append to an existing flaw carried inside a boxed error, or create a
//! new one when there is none yet.
//!
//! ## Failure policy
//!
//! Misusing the API (creating, appending or joining with an empty
//! argument) is a contract violation and panics: silently absorbing it
//! would drop diagnostic intent. Everything else degrades instead of
//! failing, since diagnostics generation must never crash the reporting
//! path: unencodable values fall back to a type-name plus
//! debug-representation pair, and capture shortfalls leave frame fields
//! empty. Degradations are reported through [`tracing`].
//!
//! ## Capabilities
//!
//! Stack walking and id generation are injected capabilities
//! ([`FrameSource`], [`IdSource`]) with production implementations
//! ([`RuntimeFrames`] on the [`backtrace`] crate, [`UuidIds`] on UUID v4),
//! so tests can run them deterministically.

#[macro_use]
mod macros;

pub mod dict;
pub mod frames;
pub mod id;
pub mod prelude;

mod encoder;
mod flaw;
mod record;
mod result_ext;

pub use self::{
    dict::{Dict, ERROR_KEY, FieldValue},
    flaw::{Flaw, JoinedError},
    frames::{Frame, FrameSource, RuntimeFrames, UNKNOWN_FUNCTION},
    id::{IdSource, UuidIds},
    record::Record,
    result_ext::ResultExt,
};

/// A [`Result`](core::result::Result) type alias where the error is
/// [`Flaw`].
///
/// ```
/// use flaw::prelude::*;
///
/// fn might_fail() -> flaw::Result<String> {
///     Ok("success".to_string())
/// }
/// ```
pub type Result<T> = core::result::Result<T, Flaw>;
