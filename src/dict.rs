//! Payload construction for context records.
//!
//! A [`Dict`] is a forward-only builder for one record's key/value payload.
//! Setters append directly into a growing byte buffer through the value
//! encoder, so building a payload never allocates an intermediate value tree
//! and never traverses the data a second time at serialization.
//!
//! Keys are not deduplicated. Appending the same key twice produces a JSON
//! object with a duplicate key; most consumers take the last value, which
//! yields last-write-wins behavior, but that is a property of the consumer
//! rather than a guarantee of this library.
//!
//! # The reserved `"error"` key
//!
//! The key `"error"` is reserved for the error chain's own description in
//! the serialized output. This library implements the strict policy: any
//! setter invoked with the reserved key is silently dropped. The payload
//! never carries a competing `"error"` field.

use core::fmt;

use time::OffsetDateTime;

use crate::encoder;

/// Key reserved for the error chain's own description.
///
/// Setters invoked with this key are silently dropped, see the
/// [module documentation](self) for details.
pub const ERROR_KEY: &str = "error";

/// A value that knows how to append itself to a payload buffer.
///
/// This is the capability interface behind [`Dict::field`] and the
/// [`dict!`](crate::dict!) macro: each supported value kind appends its own
/// JSON form, so no runtime type inspection is needed. An implementation
/// must append exactly one syntactically valid JSON value.
///
/// Implementations are provided for booleans, the signed and unsigned
/// integer families, floating point numbers, strings,
/// [`OffsetDateTime`], nested [`Dict`]s, and slices, arrays and vectors of
/// any of these. Values of a shape not covered here can still be recorded
/// through [`Dict::any`], which falls back to a type-name plus
/// debug-representation pair.
pub trait FieldValue {
    /// Appends `self` as a single JSON value.
    fn append_value(&self, buf: &mut Vec<u8>);
}

impl FieldValue for bool {
    fn append_value(&self, buf: &mut Vec<u8>) {
        encoder::append_bool(buf, *self);
    }
}

macro_rules! impl_field_value_int {
    ($append:path => $($ty:ty),+) => {
        $(impl FieldValue for $ty {
            fn append_value(&self, buf: &mut Vec<u8>) {
                $append(buf, *self as _);
            }
        })+
    };
}

impl_field_value_int!(encoder::append_i64 => i8, i16, i32, i64, isize);
impl_field_value_int!(encoder::append_u64 => u8, u16, u32, u64, usize);

impl FieldValue for f32 {
    fn append_value(&self, buf: &mut Vec<u8>) {
        encoder::append_f64(buf, f64::from(*self));
    }
}

impl FieldValue for f64 {
    fn append_value(&self, buf: &mut Vec<u8>) {
        encoder::append_f64(buf, *self);
    }
}

impl FieldValue for str {
    fn append_value(&self, buf: &mut Vec<u8>) {
        encoder::append_string(buf, self);
    }
}

impl FieldValue for String {
    fn append_value(&self, buf: &mut Vec<u8>) {
        encoder::append_string(buf, self);
    }
}

impl FieldValue for OffsetDateTime {
    fn append_value(&self, buf: &mut Vec<u8>) {
        encoder::append_time(buf, *self);
    }
}

impl<V: FieldValue + ?Sized> FieldValue for &V {
    fn append_value(&self, buf: &mut Vec<u8>) {
        (**self).append_value(buf);
    }
}

impl<V: FieldValue> FieldValue for [V] {
    fn append_value(&self, buf: &mut Vec<u8>) {
        buf.push(b'[');
        for (i, value) in self.iter().enumerate() {
            if i != 0 {
                buf.push(b',');
            }
            value.append_value(buf);
        }
        buf.push(b']');
    }
}

impl<V: FieldValue, const N: usize> FieldValue for [V; N] {
    fn append_value(&self, buf: &mut Vec<u8>) {
        self.as_slice().append_value(buf);
    }
}

impl<V: FieldValue> FieldValue for Vec<V> {
    fn append_value(&self, buf: &mut Vec<u8>) {
        self.as_slice().append_value(buf);
    }
}

impl FieldValue for Dict {
    fn append_value(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.buf);
        encoder::append_end_marker(buf);
    }
}

/// A forward-only builder for one record's key/value payload.
///
/// Setters consume and return the builder, so payloads are built by method
/// chaining:
///
/// ```
/// use flaw::Dict;
///
/// let payload = Dict::new()
///     .str("host", "localhost")
///     .int("port", 5643)
///     .dict("sql", Dict::new().str("query", "select * from artists"));
/// ```
///
/// The [`dict!`](crate::dict!) macro offers a shorthand for the common case
/// where every value already implements [`FieldValue`].
#[derive(Clone)]
pub struct Dict {
    /// An open JSON object: begin marker plus zero or more encoded fields,
    /// without the closing marker.
    buf: Vec<u8>,
}

impl Dict {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        let mut buf = Vec::new();
        encoder::append_begin_marker(&mut buf);
        Self { buf }
    }

    /// Appends any [`FieldValue`] under `key`.
    #[must_use]
    pub fn field<V: FieldValue + ?Sized>(self, key: &str, value: &V) -> Self {
        self.push_field(key, |buf| value.append_value(buf))
    }

    /// Appends a boolean field.
    #[must_use]
    pub fn bool(self, key: &str, value: bool) -> Self {
        self.push_field(key, |buf| encoder::append_bool(buf, value))
    }

    /// Appends a signed integer field.
    #[must_use]
    pub fn int(self, key: &str, value: impl Into<i64>) -> Self {
        self.push_field(key, |buf| encoder::append_i64(buf, value.into()))
    }

    /// Appends an unsigned integer field.
    #[must_use]
    pub fn uint(self, key: &str, value: impl Into<u64>) -> Self {
        self.push_field(key, |buf| encoder::append_u64(buf, value.into()))
    }

    /// Appends a floating point field.
    #[must_use]
    pub fn float(self, key: &str, value: impl Into<f64>) -> Self {
        self.push_field(key, |buf| encoder::append_f64(buf, value.into()))
    }

    /// Appends a string field.
    #[must_use]
    pub fn str(self, key: &str, value: impl AsRef<str>) -> Self {
        self.push_field(key, |buf| encoder::append_string(buf, value.as_ref()))
    }

    /// Appends an array of booleans.
    #[must_use]
    pub fn bools(self, key: &str, values: &[bool]) -> Self {
        self.push_field(key, |buf| values.append_value(buf))
    }

    /// Appends an array of signed integers.
    #[must_use]
    pub fn ints(self, key: &str, values: &[i64]) -> Self {
        self.push_field(key, |buf| values.append_value(buf))
    }

    /// Appends an array of unsigned integers.
    #[must_use]
    pub fn uints(self, key: &str, values: &[u64]) -> Self {
        self.push_field(key, |buf| values.append_value(buf))
    }

    /// Appends an array of floating point numbers.
    #[must_use]
    pub fn floats(self, key: &str, values: &[f64]) -> Self {
        self.push_field(key, |buf| values.append_value(buf))
    }

    /// Appends an array of strings.
    #[must_use]
    pub fn strs(self, key: &str, values: &[&str]) -> Self {
        self.push_field(key, |buf| values.append_value(buf))
    }

    /// Appends a nested payload under `key`.
    ///
    /// The nested payload is closed and spliced in as a JSON object.
    #[must_use]
    pub fn dict(self, key: &str, nested: Dict) -> Self {
        self.push_field(key, |buf| nested.append_value(buf))
    }

    /// Appends a timestamp in RFC 3339 format.
    #[must_use]
    pub fn time(self, key: &str, value: OffsetDateTime) -> Self {
        self.push_field(key, |buf| encoder::append_time(buf, value))
    }

    /// Appends a byte slice as a lowercase hex string.
    #[must_use]
    pub fn hex(self, key: &str, value: &[u8]) -> Self {
        self.push_field(key, |buf| encoder::append_hex(buf, value))
    }

    /// Appends a pre-encoded JSON fragment verbatim.
    ///
    /// The caller is responsible for `json` being a single valid JSON
    /// value; no validation is performed.
    #[must_use]
    pub fn raw(self, key: &str, json: &str) -> Self {
        self.push_field(key, |buf| encoder::append_raw(buf, json))
    }

    /// Appends a value of unrecognized shape as a best-effort description.
    ///
    /// The value is recorded as a `{"type": ..., "repr": ...}` pair built
    /// from [`core::any::type_name`] and the value's
    /// [`Debug`](core::fmt::Debug) form. This never fails; a misbehaving
    /// `Debug` implementation degrades to a placeholder.
    #[must_use]
    pub fn any<V: fmt::Debug + ?Sized>(self, key: &str, value: &V) -> Self {
        self.push_field(key, |buf| {
            encoder::append_begin_marker(buf);
            encoder::append_key(buf, "type");
            encoder::append_string(buf, core::any::type_name::<V>());
            encoder::append_key(buf, "repr");
            encoder::append_string(buf, &encoder::debug_repr(value));
            encoder::append_end_marker(buf);
        })
    }

    /// Whether no field has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.len() == 1
    }

    fn push_field(mut self, key: &str, append: impl FnOnce(&mut Vec<u8>)) -> Self {
        if key == ERROR_KEY {
            return self;
        }
        encoder::append_key(&mut self.buf, key);
        append(&mut self.buf);
        self
    }

    /// The encoded fields without the surrounding object markers.
    pub(crate) fn raw_fields(&self) -> &[u8] {
        &self.buf[1..]
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dict")
            .field("fields", &String::from_utf8_lossy(&self.buf))
            .finish()
    }
}
