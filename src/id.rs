//! Unique identifier assignment for new flaws.
//!
//! Identifier generation is expressed through the [`IdSource`] trait so it
//! can be injected in tests. The production source, [`UuidIds`], produces
//! random version 4 UUIDs. A source is retried a small fixed number of
//! times; if every attempt fails, a deterministic fixed-length fallback is
//! derived from the system clock so a flaw never goes without an id.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// A capability that produces opaque unique identifiers.
///
/// Returning `None` signals a failed attempt; the caller retries and
/// eventually falls back to a clock-derived id.
pub trait IdSource: Send + Sync {
    /// Attempts to generate one identifier.
    fn generate(&self) -> Option<String>;
}

/// Production [`IdSource`] producing random version 4 UUIDs in simple
/// (32 hex character) form.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn generate(&self) -> Option<String> {
        Some(Uuid::new_v4().simple().to_string())
    }
}

/// Attempts per id before falling back to the clock.
const GENERATION_ATTEMPTS: usize = 3;

/// Returns the next identifier from `source`, retrying transient failures
/// and falling back to a clock-derived id when all attempts fail.
pub(crate) fn next_id(source: &dyn IdSource) -> String {
    for _ in 0..GENERATION_ATTEMPTS {
        if let Some(id) = source.generate() {
            return id;
        }
    }
    tracing::warn!(
        attempts = GENERATION_ATTEMPTS,
        "id generation failed, falling back to a clock-derived id"
    );
    clock_id()
}

/// A 32 hex character id derived from the current wall-clock reading.
fn clock_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("{nanos:032x}")
}
