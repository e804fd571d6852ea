// tests/integration/string_commands_test.rs

//! Integration tests for string commands and generic key operations.

use super::test_helpers::{TestContext, bulk};
use citrinedb::core::CitrineError;
use citrinedb::core::protocol::RespValue;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn set_then_get_round_trips() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["SET", "k", "v"]).await,
        RespValue::SimpleString("OK".into())
    );
    assert_eq!(ctx.run(&["GET", "k"]).await, bulk("v"));
    assert_eq!(ctx.run(&["GET", "missing"]).await, RespValue::Null);
}

#[tokio::test]
async fn set_with_px_expires() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "k", "v", "PX", "50"]).await;
    assert_eq!(ctx.run(&["GET", "k"]).await, bulk("v"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(ctx.run(&["GET", "k"]).await, RespValue::Null);
}

#[tokio::test]
async fn set_with_ex_keeps_value_before_expiry() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "k", "v", "EX", "100"]).await;
    assert_eq!(ctx.run(&["GET", "k"]).await, bulk("v"));
}

#[tokio::test]
async fn set_rejects_unknown_option_and_bad_duration() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.dispatch(&["SET", "k", "v", "KEEPTTL"]).await,
        Err(CitrineError::SyntaxError)
    );
    assert_eq!(
        ctx.dispatch(&["SET", "k", "v", "PX", "soon"]).await,
        Err(CitrineError::NotAnInteger)
    );
    assert_eq!(
        ctx.dispatch(&["SET", "k", "v", "PX"]).await,
        Err(CitrineError::SyntaxError)
    );
}

#[tokio::test]
async fn incr_creates_increments_and_rejects() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["INCR", "c"]).await, RespValue::Integer(1));
    assert_eq!(ctx.run(&["INCR", "c"]).await, RespValue::Integer(2));

    ctx.run(&["SET", "n", "10"]).await;
    assert_eq!(ctx.run(&["INCR", "n"]).await, RespValue::Integer(11));

    ctx.run(&["SET", "s", "abc"]).await;
    assert_eq!(
        ctx.dispatch(&["INCR", "s"]).await,
        Err(CitrineError::NotAnInteger)
    );
}

#[tokio::test]
async fn incr_then_push_is_a_type_error() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "k", "10"]).await;
    assert_eq!(ctx.run(&["INCR", "k"]).await, RespValue::Integer(11));
    assert_eq!(
        ctx.dispatch(&["RPUSH", "k", "z"]).await,
        Err(CitrineError::WrongType)
    );
}

#[tokio::test]
async fn type_reports_value_kind() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "s", "v"]).await;
    ctx.run(&["RPUSH", "l", "a"]).await;
    ctx.run(&["ZADD", "z", "1", "m"]).await;
    ctx.run(&["XADD", "x", "1-1", "f", "v"]).await;

    assert_eq!(ctx.run(&["TYPE", "s"]).await, RespValue::SimpleString("string".into()));
    assert_eq!(ctx.run(&["TYPE", "l"]).await, RespValue::SimpleString("list".into()));
    assert_eq!(ctx.run(&["TYPE", "z"]).await, RespValue::SimpleString("zset".into()));
    assert_eq!(ctx.run(&["TYPE", "x"]).await, RespValue::SimpleString("stream".into()));
    assert_eq!(ctx.run(&["TYPE", "none"]).await, RespValue::SimpleString("none".into()));
}

#[tokio::test]
async fn keys_exact_and_star() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "one", "1"]).await;
    ctx.run(&["SET", "two", "2"]).await;

    let RespValue::Array(mut all) = ctx.run(&["KEYS", "*"]).await else {
        panic!("expected array from KEYS");
    };
    all.sort_by_key(|v| format!("{v:?}"));
    assert_eq!(all.len(), 2);

    assert_eq!(
        ctx.run(&["KEYS", "one"]).await,
        RespValue::Array(vec![bulk("one")])
    );
    assert_eq!(ctx.run(&["KEYS", "o*"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn config_get_reports_dir_and_dbfilename() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["CONFIG", "GET", "dir"]).await,
        RespValue::Array(vec![bulk("dir"), bulk(".")])
    );
    assert_eq!(
        ctx.run(&["CONFIG", "GET", "dbfilename"]).await,
        RespValue::Array(vec![bulk("dbfilename"), bulk("dump.rdb")])
    );
    assert_eq!(
        ctx.run(&["CONFIG", "GET", "appendonly"]).await,
        RespValue::Array(vec![bulk("appendonly"), bulk("")])
    );
}

#[tokio::test]
async fn echo_and_ping() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["ECHO", "hey"]).await, bulk("hey"));
    assert_eq!(
        ctx.run(&["PING"]).await,
        RespValue::SimpleString("PONG".into())
    );
    assert_eq!(ctx.run(&["PING", "hello"]).await, bulk("hello"));
}

#[tokio::test]
async fn unknown_command_is_an_error() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.dispatch(&["NOSUCHCMD"]).await,
        Err(CitrineError::UnknownCommand("NOSUCHCMD".to_string()))
    );
}
