// tests/integration/stream_commands_test.rs

//! Integration tests for stream commands.

use super::test_helpers::{TestContext, bulk};
use citrinedb::core::CitrineError;
use citrinedb::core::protocol::RespValue;

/// Expected `[id, [field, value, ...]]` shape.
fn entry(id: &str, fields: &[&str]) -> RespValue {
    RespValue::Array(vec![
        bulk(id),
        RespValue::Array(fields.iter().map(|f| bulk(f)).collect()),
    ])
}

#[tokio::test]
async fn xadd_assigns_explicit_and_partial_ids() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["XADD", "s", "1-1", "f", "v"]).await,
        bulk("1-1")
    );
    // Same ms: sequence continues.
    assert_eq!(ctx.run(&["XADD", "s", "1-*", "f", "v"]).await, bulk("1-2"));
    // New ms: sequence restarts at zero.
    assert_eq!(ctx.run(&["XADD", "s", "2-*", "f", "v"]).await, bulk("2-0"));
}

#[tokio::test]
async fn xadd_first_partial_id_at_ms_zero_is_zero_one() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["XADD", "s", "0-*", "f", "v"]).await, bulk("0-1"));
}

#[tokio::test]
async fn xadd_rejects_zero_and_non_increasing_ids() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.dispatch(&["XADD", "s", "0-0", "f", "v"]).await,
        Err(CitrineError::StreamIdZero)
    );
    // A rejected first id must not leave an empty stream behind.
    assert_eq!(ctx.run(&["TYPE", "s"]).await, RespValue::SimpleString("none".into()));

    ctx.run(&["XADD", "s", "1-1", "f", "v"]).await;
    assert_eq!(
        ctx.dispatch(&["XADD", "s", "1-1", "f", "v"]).await,
        Err(CitrineError::StreamIdTooSmall)
    );
    assert_eq!(
        ctx.dispatch(&["XADD", "s", "0-5", "f", "v"]).await,
        Err(CitrineError::StreamIdTooSmall)
    );
}

#[tokio::test]
async fn xadd_auto_id_is_strictly_increasing() {
    let mut ctx = TestContext::new();
    let RespValue::BulkString(first) = ctx.run(&["XADD", "s", "*", "f", "v"]).await else {
        panic!("expected bulk id");
    };
    let RespValue::BulkString(second) = ctx.run(&["XADD", "s", "*", "f", "v"]).await else {
        panic!("expected bulk id");
    };
    assert_ne!(first, second);
}

#[tokio::test]
async fn xrange_bounds_are_inclusive() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s", "1-1", "a", "1"]).await;
    ctx.run(&["XADD", "s", "1-2", "b", "2"]).await;
    ctx.run(&["XADD", "s", "2-1", "c", "3"]).await;

    assert_eq!(
        ctx.run(&["XRANGE", "s", "-", "+"]).await,
        RespValue::Array(vec![
            entry("1-1", &["a", "1"]),
            entry("1-2", &["b", "2"]),
            entry("2-1", &["c", "3"]),
        ])
    );
    // A bare ms start means ms-0; a bare ms end means ms-<max>.
    assert_eq!(
        ctx.run(&["XRANGE", "s", "1", "1"]).await,
        RespValue::Array(vec![entry("1-1", &["a", "1"]), entry("1-2", &["b", "2"])])
    );
    assert_eq!(
        ctx.run(&["XRANGE", "s", "1-2", "2-1"]).await,
        RespValue::Array(vec![entry("1-2", &["b", "2"]), entry("2-1", &["c", "3"])])
    );
    assert_eq!(
        ctx.run(&["XRANGE", "missing", "-", "+"]).await,
        RespValue::Array(vec![])
    );
}

#[tokio::test]
async fn xread_returns_only_strictly_newer_entries() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s", "1-1", "f", "v"]).await;
    ctx.run(&["XADD", "s", "1-2", "g", "w"]).await;

    assert_eq!(
        ctx.run(&["XREAD", "STREAMS", "s", "1-1"]).await,
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("s"),
            RespValue::Array(vec![entry("1-2", &["g", "w"])]),
        ])])
    );
    // Nothing newer: null array.
    assert_eq!(
        ctx.run(&["XREAD", "STREAMS", "s", "1-2"]).await,
        RespValue::NullArray
    );
}

#[tokio::test]
async fn xread_multi_key_reports_only_keys_with_results() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s1", "1-1", "f", "v"]).await;
    ctx.run(&["XADD", "s2", "1-1", "g", "w"]).await;

    assert_eq!(
        ctx.run(&["XREAD", "STREAMS", "s1", "s2", "0-0", "1-1"]).await,
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("s1"),
            RespValue::Array(vec![entry("1-1", &["f", "v"])]),
        ])])
    );
}

#[tokio::test]
async fn xread_dollar_resolves_to_current_top() {
    let mut ctx = TestContext::new();
    ctx.run(&["XADD", "s", "1-1", "f", "v"]).await;
    // $ means "only entries newer than now", so nothing qualifies.
    assert_eq!(
        ctx.run(&["XREAD", "STREAMS", "s", "$"]).await,
        RespValue::NullArray
    );
}

#[tokio::test]
async fn stream_commands_reject_wrong_type() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "s", "v"]).await;
    assert_eq!(
        ctx.dispatch(&["XADD", "s", "1-1", "f", "v"]).await,
        Err(CitrineError::WrongType)
    );
    assert_eq!(
        ctx.dispatch(&["XRANGE", "s", "-", "+"]).await,
        Err(CitrineError::WrongType)
    );
    assert_eq!(
        ctx.dispatch(&["XREAD", "STREAMS", "s", "0-0"]).await,
        Err(CitrineError::WrongType)
    );
}
