//! Chunk loading from strings and files, and the context error lifecycle.

use std::io::Write as _;

use luaconf::{Context, ErrorCode};
use pretty_assertions::assert_eq;

#[test]
fn load_string_defines_globals() {
    let mut conf = Context::new();
    conf.load_string("answer = 42").unwrap();
    assert_eq!(conf.get_integer("answer").unwrap(), 42);
}

#[test]
fn later_chunks_see_and_extend_earlier_ones() {
    let mut conf = Context::new();
    conf.load_string("base = 10").unwrap();
    conf.load_string("derived = base * 2").unwrap();
    assert_eq!(conf.get_integer("derived").unwrap(), 20);
    // Redefinition wins.
    conf.load_string("base = 1").unwrap();
    assert_eq!(conf.get_integer("base").unwrap(), 1);
}

#[test]
fn syntax_errors_are_load_failures() {
    let mut conf = Context::new();
    let err = conf.load_string("this is not lua").unwrap_err();
    assert_eq!(err.code(), ErrorCode::LoadFailed);
    assert!(!err.to_string().is_empty());
    assert_eq!(conf.error_code(), ErrorCode::LoadFailed);
    // Compile failure leaves the globals untouched.
    conf.load_string("ok = true").unwrap();
    assert_eq!(conf.get_boolean("ok").unwrap(), true);
}

#[test]
fn runtime_errors_are_call_failures() {
    let mut conf = Context::new();
    let err = conf.load_string("nosuchfn()").unwrap_err();
    assert_eq!(err.code(), ErrorCode::CallFailed);
    assert!(err.to_string().contains("nosuchfn"), "{err}");
}

#[test]
fn explicit_error_values_keep_their_message() {
    let mut conf = Context::new();
    let err = conf.load_string("error('config rejected')").unwrap_err();
    assert_eq!(err.code(), ErrorCode::CallFailed);
    assert!(err.to_string().contains("config rejected"), "{err}");
}

#[test]
fn load_file_executes_the_chunk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "fromfile = {{ n = 5, s = 'five' }}").unwrap();
    let mut conf = Context::new();
    conf.load_file(file.path()).unwrap();
    assert_eq!(conf.get_integer("fromfile.n").unwrap(), 5);
    assert_eq!(conf.get_string("fromfile.s").unwrap(), b"five");
}

#[test]
fn load_file_reports_the_file_in_runtime_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "error('bad file')").unwrap();
    let mut conf = Context::new();
    let err = conf.load_file(file.path()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CallFailed);
    assert!(err.to_string().contains("bad file"), "{err}");
}

#[test]
fn missing_file_is_a_load_failure() {
    let mut conf = Context::new();
    let err = conf.load_file("/nonexistent/luaconf-test.lua").unwrap_err();
    assert_eq!(err.code(), ErrorCode::LoadFailed);
    assert!(err.to_string().contains("/nonexistent/luaconf-test.lua"), "{err}");
}

#[test]
fn empty_file_name_is_rejected_up_front() {
    let mut conf = Context::new();
    let err = conf.load_file("").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(err.to_string(), "empty file name");
    assert_eq!(conf.error_string(), "empty file name");
}

#[test]
fn closed_context_refuses_everything() {
    let mut conf = Context::new();
    conf.load_string("x = 1").unwrap();
    conf.close();
    let err = conf.get_integer("x").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoEvaluator);
    assert_eq!(err.to_string(), "Lua state gone");
    let err = conf.load_string("y = 2").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoEvaluator);
    assert_eq!(conf.error_code(), ErrorCode::NoEvaluator);
    assert_eq!(conf.error_string(), "Lua state gone");
}

#[test]
fn each_operation_resets_the_cached_error() {
    let mut conf = Context::new();
    conf.load_string("x = 1").unwrap();
    assert!(conf.get_integer("nope").is_err());
    assert_eq!(conf.error_code(), ErrorCode::NotFound);
    assert_eq!(conf.get_integer("x").unwrap(), 1);
    assert_eq!(conf.error_code(), ErrorCode::Ok);
    assert_eq!(conf.error_string(), "");
}

#[test]
fn cached_message_never_exceeds_the_cap() {
    let mut conf = Context::new();
    // Syntax errors for huge chunks embed source context; the cache stays
    // bounded even then.
    let junk = format!("this is not lua {}", "x".repeat(4096));
    assert!(conf.load_string(&junk).is_err());
    assert!(conf.error_string().len() <= 128, "{}", conf.error_string().len());
    assert_eq!(conf.error_code(), ErrorCode::LoadFailed);
}
