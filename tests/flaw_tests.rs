//! Integration tests for the full flaw lifecycle: creation, annotation,
//! wrapping, joining and serialization.

use std::sync::Arc;

use flaw::{Dict, ERROR_KEY, Flaw, Frame, FrameSource, IdSource, ResultExt, UNKNOWN_FUNCTION, dict};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("permission denied")]
struct PermissionDenied;

#[derive(Debug, Error)]
#[error("disk full")]
struct DiskFull;

#[derive(Debug, Error)]
#[error("")]
struct Silent;

/// Deterministic frame source with a fixed frame list.
#[derive(Debug)]
struct FixedFrames(Vec<Frame>);

impl FrameSource for FixedFrames {
    fn capture(&self, skip: usize) -> Vec<Frame> {
        self.0.iter().skip(skip).cloned().collect()
    }
}

struct StaticIds(&'static str);

impl IdSource for StaticIds {
    fn generate(&self) -> Option<String> {
        Some(self.0.to_owned())
    }
}

fn frame(file: &str, line: u32, function: &str) -> Frame {
    Frame {
        file: file.to_owned(),
        line,
        function: function.to_owned(),
    }
}

fn fixed_source() -> Arc<FixedFrames> {
    Arc::new(FixedFrames(vec![
        frame("db.rs", 38, "db::connect"),
        frame("user.rs", 51, "user::create"),
        frame("main.rs", 149, "main"),
    ]))
}

#[test]
fn accumulates_records_in_call_order() {
    let flaw = Flaw::from_error(PermissionDenied)
        .append([dict! { "host" => "localhost", "port" => 5643 }]);
    let flaw = Flaw::wrap(flaw, "failed to create user", dict! { "id" => "a", "age" => 42 });

    assert_eq!(flaw.inner(), "permission denied");
    assert_eq!(flaw.records().len(), 2);
    assert_eq!(
        flaw.records()[0].payload_json(),
        r#"{"host":"localhost","port":5643}"#
    );
    assert_eq!(flaw.records()[0].message(), None);
    assert_eq!(flaw.records()[1].message(), Some("failed to create user"));
    assert_eq!(flaw.records()[1].payload_json(), r#"{"id":"a","age":42}"#);

    assert!(!flaw.stack_trace().is_empty());
    assert!(
        flaw.stack_trace()[0]
            .function
            .contains("accumulates_records_in_call_order"),
        "first frame should be the creation call site, got {:?}",
        flaw.stack_trace()[0]
    );
}

#[test]
fn wrap_preserves_identity_and_frames() {
    let flaw = Flaw::from_error_with(PermissionDenied, fixed_source(), &StaticIds("id-1"));
    let id = flaw.id().to_owned();
    let frames_before = flaw.stack_trace().to_vec();

    let flaw = Flaw::wrap(flaw, "first wrap", dict! { "a" => 1 });
    let flaw = Flaw::wrap(flaw, "second wrap", dict! { "b" => 2 });

    assert_eq!(flaw.id(), id);
    assert_eq!(flaw.stack_trace(), frames_before.as_slice());
    assert_eq!(flaw.records().len(), 2);
    assert_eq!(flaw.records()[0].message(), Some("first wrap"));
    assert_eq!(flaw.records()[1].message(), Some("second wrap"));
    assert_eq!(flaw.records()[0].function(), "db::connect");
}

#[test]
fn wrap_creates_when_failure_is_not_a_flaw() {
    let flaw = Flaw::wrap(PermissionDenied, "failed to create user", dict! { "id" => "a" });

    assert_eq!(flaw.inner(), "failed to create user: permission denied");
    assert_eq!(flaw.records().len(), 1);
    assert_eq!(flaw.records()[0].payload_json(), r#"{"id":"a"}"#);
    assert!(!flaw.stack_trace().is_empty());
}

#[test]
fn fragments_merge_left_to_right_with_last_key_wins() {
    let flaw = Flaw::from_error("boom").append([
        dict! { "key" => "bad-key", "value" => "a" },
        dict! {},
        dict! { "value" => "b", "x" => 2 },
    ]);

    let parsed: serde_json::Value =
        serde_json::from_str(flaw.records()[0].payload_json()).expect("payload is valid JSON");
    assert_eq!(
        parsed,
        serde_json::json!({ "key": "bad-key", "value": "b", "x": 2 })
    );
}

#[test]
fn payload_round_trips_through_generic_json() {
    let payload = Dict::new()
        .bool("flag", true)
        .int("int", -42)
        .uint("uint", u64::MAX)
        .float("float", 2.5)
        .str("text", "with \"quotes\" and\nnewline")
        .bools("flags", &[true, false])
        .ints("ints", &[1, -2])
        .uints("uints", &[3, 4])
        .floats("floats", &[0.5, -1.25])
        .strs("strs", &["a", "b"])
        .hex("bytes", &[0xde, 0xad])
        .dict(
            "nested",
            Dict::new()
                .str("inner", "value")
                .dict("deep", Dict::new().int("n", 1)),
        );
    let flaw = Flaw::from_error("boom").append([payload]);

    let parsed: serde_json::Value =
        serde_json::from_str(flaw.records()[0].payload_json()).expect("payload is valid JSON");
    assert_eq!(
        parsed,
        serde_json::json!({
            "flag": true,
            "int": -42,
            "uint": u64::MAX,
            "float": 2.5,
            "text": "with \"quotes\" and\nnewline",
            "flags": [true, false],
            "ints": [1, -2],
            "uints": [3, 4],
            "floats": [0.5, -1.25],
            "strs": ["a", "b"],
            "bytes": "dead",
            "nested": { "inner": "value", "deep": { "n": 1 } },
        })
    );
}

#[test]
fn join_appends_secondary_without_touching_records() {
    let flaw = Flaw::from_error(PermissionDenied).append([dict! { "k" => 1 }]);
    let inner_before = flaw.inner().to_owned();
    let records_before = flaw.records().len();

    let flaw = flaw.join(DiskFull);

    assert_eq!(flaw.inner(), inner_before);
    assert_eq!(flaw.records().len(), records_before);
    assert_eq!(flaw.joined_errors().len(), 1);

    let joined = &flaw.joined_errors()[0];
    assert_eq!(joined.message(), "disk full");
    assert!(joined.type_name().contains("DiskFull"));
    assert_eq!(joined.repr(), "DiskFull");
    let caller = joined.caller().expect("caller frame should be captured");
    assert!(
        caller.function.contains("join_appends_secondary"),
        "caller should be the joining call site, got {caller:?}"
    );
}

#[test]
fn serializes_deterministically_under_fixed_sources() {
    let flaw = Flaw::from_error_with(PermissionDenied, fixed_source(), &StaticIds("id-1"))
        .append([dict! { "host" => "localhost", "port" => 5643 }])
        .join(DiskFull);

    assert_eq!(
        flaw.serialize(),
        concat!(
            r#"{"id":"id-1","error":"permission denied","#,
            r#""records":[{"function":"db::connect","payload":{"host":"localhost","port":5643}}],"#,
            r#""stack_trace":[{"location":"db.rs:38","function":"db::connect"},"#,
            r#"{"location":"user.rs:51","function":"user::create"},"#,
            r#"{"location":"main.rs:149","function":"main"}],"#,
            r#""joined_errors":[{"message":"disk full","type":"flaw_tests::DiskFull","#,
            r#""repr":"DiskFull","caller_stack_trace":{"location":"db.rs:38","function":"db::connect"}}]}"#
        )
    );
    assert_eq!(flaw.to_string(), flaw.serialize());
}

#[test]
fn serialized_form_is_parsable_json_with_live_frames() {
    let flaw = Flaw::from_error(PermissionDenied)
        .append([dict! { "k" => "v" }])
        .join(DiskFull);

    let parsed: serde_json::Value =
        serde_json::from_str(&flaw.serialize()).expect("serialized flaw is valid JSON");
    let object = parsed.as_object().expect("top level is an object");
    for key in ["id", "error", "records", "stack_trace", "joined_errors"] {
        assert!(object.contains_key(key), "missing top-level key {key}");
    }
    assert_eq!(object["error"], serde_json::json!("permission denied"));
}

#[test]
fn result_ext_wraps_once_and_then_appends() {
    fn connect() -> Result<(), std::io::Error> {
        Err(std::io::Error::other("permission denied"))
    }

    let flaw = connect()
        .flaw_with("failed to connect", dict! { "host" => "localhost" })
        .unwrap_err();
    assert_eq!(flaw.inner(), "failed to connect: permission denied");
    assert_eq!(flaw.records().len(), 1);

    let result: Result<(), Flaw> = Err(flaw);
    let flaw = result.flaw("failed to create user").unwrap_err();
    assert_eq!(flaw.inner(), "failed to connect: permission denied");
    assert_eq!(flaw.records().len(), 2);
    assert_eq!(flaw.records()[1].message(), Some("failed to create user"));
}

#[test]
fn reserved_key_never_reaches_the_payload() {
    let flaw = Flaw::from_error("boom").append([dict! { ERROR_KEY => "smuggled", "kept" => 1 }]);
    assert_eq!(flaw.records()[0].payload_json(), r#"{"kept":1}"#);
}

#[test]
fn producer_degrades_to_unknown_without_frames() {
    let source = Arc::new(FixedFrames(Vec::new()));
    let flaw = Flaw::from_error_with(PermissionDenied, source, &StaticIds("id-2"))
        .append([dict! { "k" => 1 }]);

    assert!(flaw.stack_trace().is_empty());
    assert_eq!(flaw.records()[0].function(), UNKNOWN_FUNCTION);
    assert!(flaw.joined_errors().is_empty());
}

#[test]
#[should_panic(expected = "empty description")]
fn creating_from_an_empty_description_panics() {
    let _ = Flaw::from_error("");
}

#[test]
#[should_panic(expected = "at least one payload fragment")]
fn appending_nothing_panics() {
    let _ = Flaw::from_error("boom").append(Vec::<Dict>::new());
}

#[test]
#[should_panic(expected = "empty message")]
fn wrapping_with_an_empty_message_panics() {
    let _ = Flaw::wrap(PermissionDenied, "", Dict::new());
}

#[test]
#[should_panic(expected = "empty description")]
fn wrapping_an_empty_failure_description_panics() {
    let _ = Flaw::wrap(Silent, "failed to create user", dict! { "id" => "a" });
}

#[test]
#[should_panic(expected = "non-empty payload fragment")]
fn appending_only_empty_fragments_panics() {
    let _ = Flaw::from_error("boom").append([Dict::new(), Dict::new()]);
}

#[test]
#[should_panic(expected = "empty description")]
fn joining_an_empty_description_panics() {
    let _ = Flaw::from_error("boom").join(Silent);
}
