//! One unit of context attached to a flaw.

use crate::{dict::Dict, encoder};

/// One ordered contextual contribution to a [`Flaw`](crate::Flaw).
///
/// A record carries the identity of the function that produced it, an
/// optional short message, and a payload built through the value encoder.
/// Records are appended in call order and never reordered or removed.
#[derive(Clone, Debug)]
pub struct Record {
    function: String,
    message: Option<String>,
    payload: String,
}

impl Record {
    /// Builds a record by merging payload fragments left to right.
    ///
    /// Fragments are spliced in append order, so on key collision a later
    /// fragment's field follows the earlier one and last-key-wins
    /// consumers observe the later value.
    pub(crate) fn from_fragments(
        function: String,
        message: Option<String>,
        fragments: &[Dict],
    ) -> Self {
        let mut buf = Vec::new();
        encoder::append_begin_marker(&mut buf);
        for fragment in fragments {
            let fields = fragment.raw_fields();
            if fields.is_empty() {
                continue;
            }
            if buf.last() != Some(&b'{') {
                buf.push(b',');
            }
            buf.extend_from_slice(fields);
        }
        encoder::append_end_marker(&mut buf);

        Self {
            function,
            message,
            // The encoder only ever appends valid UTF-8.
            payload: String::from_utf8_lossy(&buf).into_owned(),
        }
    }

    /// The qualified name of the function that added this record.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The short message supplied when wrapping, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The record's payload as JSON object text.
    #[must_use]
    pub fn payload_json(&self) -> &str {
        &self.payload
    }

    /// Appends this record's serialized object form.
    pub(crate) fn append_to(&self, buf: &mut Vec<u8>) {
        encoder::append_begin_marker(buf);
        encoder::append_key(buf, "function");
        encoder::append_string(buf, &self.function);
        if let Some(message) = &self.message {
            encoder::append_key(buf, "message");
            encoder::append_string(buf, message);
        }
        encoder::append_key(buf, "payload");
        encoder::append_raw(buf, &self.payload);
        encoder::append_end_marker(buf);
    }
}
