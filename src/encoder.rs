//! Append-only JSON value encoder.
//!
//! Every function in this module takes the current buffer state and appends
//! exactly one syntactically valid piece of JSON: a quoted and escaped
//! string, an exact-decimal number, a `true`/`false` literal, or a
//! structural marker. There is no intermediate value tree and no reflection;
//! payloads are built forward-only, one append at a time.
//!
//! The encoder never fails. Values that cannot be formatted degrade to a
//! best-effort representation and the shortfall is reported on the side
//! diagnostic channel (`tracing`), since diagnostics generation must never
//! crash the reporting path.

use core::fmt::{self, Write as _};
use std::io::Write as _;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Opens a JSON object.
pub(crate) fn append_begin_marker(buf: &mut Vec<u8>) {
    buf.push(b'{');
}

/// Closes a JSON object.
pub(crate) fn append_end_marker(buf: &mut Vec<u8>) {
    buf.push(b'}');
}

/// Appends an object key, inserting a separating comma when the buffer does
/// not end at an opening marker.
pub(crate) fn append_key(buf: &mut Vec<u8>, key: &str) {
    if !matches!(buf.last(), None | Some(b'{') | Some(b'[')) {
        buf.push(b',');
    }
    append_string(buf, key);
    buf.push(b':');
}

/// Appends a quoted, escaped JSON string.
pub(crate) fn append_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for c in s.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                let b = c as u32;
                buf.extend_from_slice(b"\\u00");
                buf.push(HEX_DIGITS[(b >> 4) as usize]);
                buf.push(HEX_DIGITS[(b & 0xf) as usize]);
            }
            c => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

/// Appends a `true`/`false` literal.
pub(crate) fn append_bool(buf: &mut Vec<u8>, b: bool) {
    buf.extend_from_slice(if b { b"true" } else { b"false" });
}

/// Appends a signed integer in exact decimal form.
pub(crate) fn append_i64(buf: &mut Vec<u8>, i: i64) {
    append_display(buf, i);
}

/// Appends an unsigned integer in exact decimal form.
pub(crate) fn append_u64(buf: &mut Vec<u8>, i: u64) {
    append_display(buf, i);
}

/// Appends a floating point number.
///
/// Finite values use Rust's shortest round-trippable decimal form, which
/// never produces scientific notation. Non-finite values have no JSON
/// number representation and degrade to the strings `"NaN"`, `"+Inf"` and
/// `"-Inf"`.
pub(crate) fn append_f64(buf: &mut Vec<u8>, f: f64) {
    if f.is_nan() {
        append_string(buf, "NaN");
    } else if f.is_infinite() {
        append_string(buf, if f > 0.0 { "+Inf" } else { "-Inf" });
    } else {
        append_display(buf, f);
    }
}

/// Appends a byte slice as a quoted lowercase hex string.
pub(crate) fn append_hex(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.push(b'"');
    for b in bytes {
        buf.push(HEX_DIGITS[(b >> 4) as usize]);
        buf.push(HEX_DIGITS[(b & 0xf) as usize]);
    }
    buf.push(b'"');
}

/// Appends a timestamp as a quoted RFC 3339 string.
///
/// A timestamp that cannot be expressed in RFC 3339 (for example a year
/// outside its range) degrades to the quoted debug form of the value.
pub(crate) fn append_time(buf: &mut Vec<u8>, t: OffsetDateTime) {
    match t.format(&Rfc3339) {
        Ok(formatted) => append_string(buf, &formatted),
        Err(error) => {
            tracing::warn!(%error, "timestamp is not representable as RFC 3339");
            append_string(buf, &debug_repr(&t));
        }
    }
}

/// Appends a pre-encoded JSON fragment verbatim.
///
/// The caller is responsible for the fragment being a single valid JSON
/// value.
pub(crate) fn append_raw(buf: &mut Vec<u8>, json: &str) {
    buf.extend_from_slice(json.as_bytes());
}

fn append_display(buf: &mut Vec<u8>, value: impl fmt::Display) {
    // Writing into a Vec cannot fail.
    let _ = write!(buf, "{value}");
}

/// Formats a value through its [`Debug`](core::fmt::Debug) implementation
/// without letting a misbehaving implementation abort the reporting path.
pub(crate) fn debug_repr<T: fmt::Debug + ?Sized>(value: &T) -> String {
    let mut out = String::new();
    if write!(out, "{value:?}").is_err() {
        tracing::warn!("debug implementation failed while formatting a diagnostic value");
        out = "<unformattable>".to_owned();
    }
    out
}

/// Formats a value through its [`Display`](core::fmt::Display)
/// implementation, degrading instead of failing.
pub(crate) fn display_repr<T: fmt::Display + ?Sized>(value: &T) -> String {
    let mut out = String::new();
    if write!(out, "{value}").is_err() {
        tracing::warn!("display implementation failed while formatting a diagnostic value");
        out = "<unformattable>".to_owned();
    }
    out
}
