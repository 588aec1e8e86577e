//! The accumulating error core.

use core::fmt;
use std::{error::Error, sync::Arc};

use crate::{
    dict::Dict,
    encoder,
    frames::{self, Frame, FrameSource},
    id::{self, IdSource, UuidIds},
    record::Record,
};

/// A secondary failure observed while handling the primary one.
///
/// Joined failures record things like a resource-release failure inside a
/// cleanup path. They never replace the primary failure's identity; they
/// are appended alongside it.
#[derive(Clone, Debug)]
pub struct JoinedError {
    message: String,
    type_name: &'static str,
    repr: String,
    caller: Option<Frame>,
}

impl JoinedError {
    /// The secondary failure's description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The secondary failure's type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name
    }

    /// The secondary failure's debug representation.
    #[must_use]
    pub fn repr(&self) -> &str {
        &self.repr
    }

    /// The frame that joined the failure, when capture succeeded.
    #[must_use]
    pub fn caller(&self) -> Option<&Frame> {
        self.caller.as_ref()
    }
}

/// The accumulating error value.
///
/// A `Flaw` is created once from a plain failure, capturing the call stack
/// at that point, and then annotated additively as it propagates up the
/// call chain: each layer appends an ordered [`Record`] of contextual data,
/// and secondary failures observed along the error path can be joined
/// without replacing the primary failure. At the reporting boundary,
/// [`serialize`](Flaw::serialize) (or plain [`Display`](core::fmt::Display)
/// printing) produces the full structured JSON form.
///
/// ```
/// use flaw::{Flaw, dict};
///
/// fn connect() -> Result<(), Flaw> {
///     let failure = std::io::Error::other("permission denied");
///     Err(Flaw::from_error(failure).append([dict! {
///         "host" => "localhost",
///         "port" => 5643,
///     }]))
/// }
///
/// let flaw = connect().unwrap_err();
/// assert_eq!(flaw.inner(), "permission denied");
/// assert_eq!(flaw.records().len(), 1);
/// ```
///
/// Mutation requires exclusive ownership; the annotating operations consume
/// and return the value, matching the single-owner hand-off of an error
/// propagating up one call chain. Once all mutation has completed, reading
/// and serializing from multiple observers is safe.
pub struct Flaw {
    id: String,
    inner: String,
    records: Vec<Record>,
    stack_trace: Vec<Frame>,
    joined: Vec<JoinedError>,
    capture: Arc<dyn FrameSource>,
}

impl Flaw {
    /// Creates a new `Flaw` from a plain failure.
    ///
    /// The call stack is captured here, exactly once per flaw, so the
    /// trace stays pinned to the true origin of the failure. An id is
    /// assigned from the default id source.
    ///
    /// # Panics
    ///
    /// Panics if the failure's description is empty. Creating a flaw from
    /// nothing is a programmer error, and absorbing it would silently drop
    /// diagnostic intent.
    #[must_use]
    #[track_caller]
    pub fn from_error(failure: impl fmt::Display) -> Self {
        Self::from_error_with(failure, frames::default_source(), &UuidIds)
    }

    /// Creates a new `Flaw` with injected frame and id sources.
    ///
    /// The flaw keeps using `capture` for caller identity in later
    /// [`append`](Flaw::append), [`wrap`](Flaw::wrap) and
    /// [`join`](Flaw::join) calls, which makes the whole lifecycle
    /// deterministic under a fixed frame list.
    ///
    /// # Panics
    ///
    /// Panics if the failure's description is empty.
    #[must_use]
    #[track_caller]
    pub fn from_error_with(
        failure: impl fmt::Display,
        capture: Arc<dyn FrameSource>,
        ids: &dyn IdSource,
    ) -> Self {
        let inner = encoder::display_repr(&failure);
        assert!(
            !inner.is_empty(),
            "cannot create a flaw from a failure with an empty description"
        );

        let stack_trace = capture.capture(0);
        if stack_trace.is_empty() {
            tracing::debug!("stack capture returned no frames");
        }

        Self {
            id: id::next_id(ids),
            inner,
            records: Vec::new(),
            stack_trace,
            joined: Vec::new(),
            capture,
        }
    }

    /// Appends a record to an existing flaw inside `failure`, or creates a
    /// new one.
    ///
    /// If `failure` already carries a `Flaw`, a new [`Record`] with the
    /// calling function, `message` and `payload` is appended and the same
    /// instance is returned: same id, same captured frames, all earlier
    /// records intact. Otherwise a new flaw is created with
    /// `"{message}: {failure}"` as its inner message and the payload as
    /// its first record.
    ///
    /// # Panics
    ///
    /// Panics if `message` or the failure's description is empty.
    #[must_use]
    #[track_caller]
    pub fn wrap<E>(failure: E, message: impl Into<String>, payload: Dict) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let message = message.into();
        assert!(!message.is_empty(), "cannot wrap a failure with an empty message");

        match failure.into().downcast::<Flaw>() {
            Ok(flaw) => {
                let mut flaw = *flaw;
                let producer = frames::producer(flaw.capture.as_ref(), 0);
                flaw.records
                    .push(Record::from_fragments(producer, Some(message), &[payload]));
                flaw
            }
            Err(other) => {
                let description = encoder::display_repr(other.as_ref());
                assert!(
                    !description.is_empty(),
                    "cannot create a flaw from a failure with an empty description"
                );
                let mut flaw = Self::from_error(format!("{message}: {description}"));
                let producer = frames::producer(flaw.capture.as_ref(), 0);
                flaw.records
                    .push(Record::from_fragments(producer, Some(message), &[payload]));
                flaw
            }
        }
    }

    /// Appends one record built from `fragments`.
    ///
    /// Fragments are merged left to right into a single record; on key
    /// collision the later fragment's field is appended after the earlier
    /// one, so consumers that take the last value observe last-write-wins.
    /// The record is tagged with the calling function's identity. No new
    /// stack capture happens here.
    ///
    /// # Panics
    ///
    /// Panics if no fragment is supplied, or if every supplied fragment is
    /// empty. An annotation that contributes no data is a programmer error,
    /// not a valid record.
    #[must_use]
    #[track_caller]
    pub fn append<I>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = Dict>,
    {
        let fragments: Vec<Dict> = fragments.into_iter().collect();
        assert!(
            !fragments.is_empty(),
            "append requires at least one payload fragment"
        );
        assert!(
            fragments.iter().any(|fragment| !fragment.is_empty()),
            "append requires at least one non-empty payload fragment"
        );

        let producer = frames::producer(self.capture.as_ref(), 0);
        self.records
            .push(Record::from_fragments(producer, None, &fragments));
        self
    }

    /// Records a secondary failure observed while handling this one.
    ///
    /// A single calling frame is captured, not a full trace. Joining never
    /// alters the inner message or the records; it only appends to the
    /// joined failures.
    ///
    /// # Panics
    ///
    /// Panics if the secondary failure's description is empty.
    #[must_use]
    #[track_caller]
    pub fn join<E: Error>(mut self, secondary: E) -> Self {
        let message = encoder::display_repr(&secondary);
        assert!(
            !message.is_empty(),
            "cannot join a failure with an empty description"
        );

        let caller = self.capture.caller(0);
        if caller.is_none() {
            tracing::debug!("caller frame unavailable for joined failure");
        }

        self.joined.push(JoinedError {
            message,
            type_name: core::any::type_name::<E>(),
            repr: encoder::debug_repr(&secondary),
            caller,
        });
        self
    }

    /// The opaque unique identifier assigned at creation.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The description supplied when the error chain began.
    #[must_use]
    pub fn inner(&self) -> &str {
        &self.inner
    }

    /// The accumulated records, in annotation order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The frames captured when the chain began, innermost first.
    #[must_use]
    pub fn stack_trace(&self) -> &[Frame] {
        &self.stack_trace
    }

    /// The joined secondary failures, in join order.
    #[must_use]
    pub fn joined_errors(&self) -> &[JoinedError] {
        &self.joined
    }

    /// Serializes the flaw to its full structured JSON form.
    ///
    /// The shape is deterministic; all five top-level keys are always
    /// present:
    ///
    /// ```json
    /// {
    ///   "id": "…",
    ///   "error": "…",
    ///   "records": [{"function": "…", "message": "…", "payload": {}}],
    ///   "stack_trace": [{"location": "file:line", "function": "…"}],
    ///   "joined_errors": [{"message": "…", "type": "…", "repr": "…",
    ///                      "caller_stack_trace": {"location": "…", "function": "…"}}]
    /// }
    /// ```
    ///
    /// A record's `message` key is omitted when no message was supplied; a
    /// joined error's `caller_stack_trace` is omitted when frame capture
    /// failed.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut buf = Vec::new();
        encoder::append_begin_marker(&mut buf);

        encoder::append_key(&mut buf, "id");
        encoder::append_string(&mut buf, &self.id);
        encoder::append_key(&mut buf, "error");
        encoder::append_string(&mut buf, &self.inner);

        encoder::append_key(&mut buf, "records");
        buf.push(b'[');
        for (i, record) in self.records.iter().enumerate() {
            if i != 0 {
                buf.push(b',');
            }
            record.append_to(&mut buf);
        }
        buf.push(b']');

        encoder::append_key(&mut buf, "stack_trace");
        buf.push(b'[');
        for (i, frame) in self.stack_trace.iter().enumerate() {
            if i != 0 {
                buf.push(b',');
            }
            append_frame(&mut buf, frame);
        }
        buf.push(b']');

        encoder::append_key(&mut buf, "joined_errors");
        buf.push(b'[');
        for (i, joined) in self.joined.iter().enumerate() {
            if i != 0 {
                buf.push(b',');
            }
            encoder::append_begin_marker(&mut buf);
            encoder::append_key(&mut buf, "message");
            encoder::append_string(&mut buf, &joined.message);
            encoder::append_key(&mut buf, "type");
            encoder::append_string(&mut buf, joined.type_name);
            encoder::append_key(&mut buf, "repr");
            encoder::append_string(&mut buf, &joined.repr);
            if let Some(frame) = &joined.caller {
                encoder::append_key(&mut buf, "caller_stack_trace");
                append_frame(&mut buf, frame);
            }
            encoder::append_end_marker(&mut buf);
        }
        buf.push(b']');

        encoder::append_end_marker(&mut buf);
        // The encoder only ever appends valid UTF-8.
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn append_frame(buf: &mut Vec<u8>, frame: &Frame) {
    encoder::append_begin_marker(buf);
    encoder::append_key(buf, "location");
    encoder::append_string(buf, &frame.location());
    encoder::append_key(buf, "function");
    encoder::append_string(buf, &frame.function);
    encoder::append_end_marker(buf);
}

impl fmt::Display for Flaw {
    /// The default textual description is the full serialized form, so
    /// even naive printing surfaces the accumulated context.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Debug for Flaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flaw")
            .field("id", &self.id)
            .field("inner", &self.inner)
            .field("records", &self.records)
            .field("stack_trace", &self.stack_trace)
            .field("joined", &self.joined)
            .finish_non_exhaustive()
    }
}

impl Error for Flaw {}
