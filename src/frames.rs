//! Stack frame capture and caller identity.
//!
//! Capture is expressed through the [`FrameSource`] trait so it can be
//! injected: production code uses [`RuntimeFrames`], which walks the live
//! call stack through the [`backtrace`] crate, while tests can supply a
//! deterministic fixed frame list.
//!
//! A full capture happens exactly once per new [`Flaw`](crate::Flaw), at
//! the point the error chain begins. Later annotations only resolve the
//! single calling frame to tag each record with its producing function.

use std::sync::{Arc, OnceLock};

/// Sentinel producer name used when caller resolution fails.
pub const UNKNOWN_FUNCTION: &str = "unknown";

/// One stack location captured at error-origin time.
///
/// Fields are best-effort: `file` is empty and `line` is `0` when the
/// runtime could not resolve them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Source file path, empty when unknown.
    pub file: String,
    /// Line number, `0` when unknown.
    pub line: u32,
    /// Qualified function name, empty when unknown.
    pub function: String,
}

impl Frame {
    /// The frame's `file:line` form used in serialized output.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// A capability that produces ordered stack frames for the calling stack.
///
/// `skip` is the number of innermost remaining frames to discard, counted
/// after the source has already discarded its own internals. Returned
/// frames are ordered from innermost-remaining to outermost. A partial or
/// empty result is acceptable; capture never fails.
pub trait FrameSource: Send + Sync {
    /// Captures the calling stack, skipping `skip` innermost frames.
    fn capture(&self, skip: usize) -> Vec<Frame>;

    /// Resolves a single calling frame, skipping `skip` innermost frames.
    fn caller(&self, skip: usize) -> Option<Frame> {
        self.capture(skip).into_iter().next()
    }
}

/// Resolves the qualified name of the function that invoked the current
/// operation, or [`UNKNOWN_FUNCTION`] when resolution fails.
pub(crate) fn producer(source: &dyn FrameSource, skip: usize) -> String {
    match source.caller(skip) {
        Some(frame) if !frame.function.is_empty() => frame.function,
        _ => UNKNOWN_FUNCTION.to_owned(),
    }
}

/// The shared production frame source, configured from the environment
/// once per process.
pub(crate) fn default_source() -> Arc<dyn FrameSource> {
    static SOURCE: OnceLock<Arc<RuntimeFrames>> = OnceLock::new();
    SOURCE
        .get_or_init(|| Arc::new(RuntimeFrames::from_env()))
        .clone()
}

/// Frames from these crates are discarded while they appear at the start
/// of a capture, so traces begin at the caller of this library.
const SKIPPED_INITIAL_CRATES: &[&str] = &["backtrace", "flaw", "core", "std", "alloc"];

/// Production [`FrameSource`] backed by the live call stack.
///
/// Symbol resolution is best-effort: frames without a resolvable symbol
/// name are dropped, and a missing file name or line number leaves the
/// corresponding [`Frame`] field empty rather than failing the capture.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeFrames {
    /// Depth ceiling; frames beyond it are silently truncated.
    pub max_frames: usize,
}

impl RuntimeFrames {
    /// Default capture settings with a 64 frame ceiling.
    pub const DEFAULT: Self = Self { max_frames: 64 };

    /// Creates capture settings from the environment.
    ///
    /// Setting `FLAW_BACKTRACE=full` removes the depth ceiling. The
    /// environment is read once per process.
    #[must_use]
    pub fn from_env() -> Self {
        static FULL: OnceLock<bool> = OnceLock::new();
        let full = *FULL
            .get_or_init(|| std::env::var_os("FLAW_BACKTRACE").is_some_and(|var| var == "full"));
        if full {
            Self {
                max_frames: usize::MAX,
            }
        } else {
            Self::DEFAULT
        }
    }
}

impl Default for RuntimeFrames {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FrameSource for RuntimeFrames {
    fn capture(&self, skip: usize) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut initial_filtering = true;
        let mut to_skip = skip;

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                let Some(sym) = symbol.name() else {
                    return;
                };
                if frames.len() >= self.max_frames {
                    return;
                }

                let function = format!("{sym:#}");
                if initial_filtering {
                    if SKIPPED_INITIAL_CRATES.contains(&crate_of(&function)) {
                        return;
                    }
                    initial_filtering = false;
                }
                if to_skip > 0 {
                    to_skip -= 1;
                    return;
                }

                frames.push(Frame {
                    file: symbol
                        .filename()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default(),
                    line: symbol.lineno().unwrap_or(0),
                    function,
                });
            });

            frames.len() < self.max_frames
        });

        frames
    }
}

/// Extracts the leading crate segment of a demangled symbol name.
fn crate_of(function: &str) -> &str {
    let function = function.trim_start_matches('<');
    function.split("::").next().unwrap_or(function)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_segment_extraction() {
        assert_eq!(crate_of("flaw::frames::tests::run"), "flaw");
        assert_eq!(
            crate_of("<flaw::frames::RuntimeFrames as core::fmt::Debug>::fmt"),
            "flaw"
        );
        assert_eq!(crate_of("main"), "main");
    }

    #[test]
    fn runtime_capture_is_bounded() {
        let frames = RuntimeFrames { max_frames: 2 }.capture(0);
        assert!(frames.len() <= 2);
    }

    #[test]
    fn producer_falls_back_to_unknown() {
        struct NoFrames;
        impl FrameSource for NoFrames {
            fn capture(&self, _skip: usize) -> Vec<Frame> {
                Vec::new()
            }
        }

        assert_eq!(producer(&NoFrames, 0), UNKNOWN_FUNCTION);
    }

    #[test]
    fn caller_skips_requested_frames() {
        struct Fixed;
        impl FrameSource for Fixed {
            fn capture(&self, skip: usize) -> Vec<Frame> {
                ["inner", "middle", "outer"]
                    .iter()
                    .skip(skip)
                    .map(|name| Frame {
                        file: "a.rs".to_owned(),
                        line: 1,
                        function: (*name).to_owned(),
                    })
                    .collect()
            }
        }

        assert_eq!(Fixed.caller(1).map(|f| f.function).as_deref(), Some("middle"));
    }
}
