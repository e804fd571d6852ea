// tests/integration/list_commands_test.rs

//! Integration tests for list commands.

use super::test_helpers::{TestContext, array_of_bulks, bulk};
use citrinedb::core::CitrineError;
use citrinedb::core::protocol::RespValue;

#[tokio::test]
async fn rpush_appends_and_lrange_reads_back() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["RPUSH", "k", "a", "b", "c"]).await,
        RespValue::Integer(3)
    );
    assert_eq!(
        ctx.run(&["LRANGE", "k", "0", "-1"]).await,
        array_of_bulks(&["a", "b", "c"])
    );

    // LPUSH prepends each element in turn.
    assert_eq!(
        ctx.run(&["LPUSH", "k", "x", "y"]).await,
        RespValue::Integer(5)
    );
    assert_eq!(
        ctx.run(&["LRANGE", "k", "0", "-1"]).await,
        array_of_bulks(&["y", "x", "a", "b", "c"])
    );
}

#[tokio::test]
async fn lrange_index_normalisation() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "k", "a", "b", "c", "d"]).await;

    assert_eq!(
        ctx.run(&["LRANGE", "k", "-2", "-1"]).await,
        array_of_bulks(&["c", "d"])
    );
    assert_eq!(
        ctx.run(&["LRANGE", "k", "1", "99"]).await,
        array_of_bulks(&["b", "c", "d"])
    );
    assert_eq!(ctx.run(&["LRANGE", "k", "3", "1"]).await, RespValue::Array(vec![]));
    assert_eq!(ctx.run(&["LRANGE", "k", "9", "12"]).await, RespValue::Array(vec![]));
    assert_eq!(
        ctx.run(&["LRANGE", "missing", "0", "-1"]).await,
        RespValue::Array(vec![])
    );
    assert_eq!(
        ctx.dispatch(&["LRANGE", "k", "zero", "1"]).await,
        Err(CitrineError::RangeNotAnInteger)
    );
}

#[tokio::test]
async fn llen_counts_and_missing_is_zero() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["LLEN", "k"]).await, RespValue::Integer(0));
    ctx.run(&["RPUSH", "k", "a", "b"]).await;
    assert_eq!(ctx.run(&["LLEN", "k"]).await, RespValue::Integer(2));
}

#[tokio::test]
async fn lpop_without_count_pops_one() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "k", "a", "b"]).await;
    assert_eq!(ctx.run(&["LPOP", "k"]).await, bulk("a"));
    assert_eq!(ctx.run(&["LPOP", "k"]).await, bulk("b"));
    // The drained key is gone, and further pops are null.
    assert_eq!(ctx.run(&["TYPE", "k"]).await, RespValue::SimpleString("none".into()));
    assert_eq!(ctx.run(&["LPOP", "k"]).await, RespValue::Null);
}

#[tokio::test]
async fn lpop_with_count_pops_up_to_count() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "k", "a", "b", "c"]).await;
    assert_eq!(
        ctx.run(&["LPOP", "k", "2"]).await,
        array_of_bulks(&["a", "b"])
    );
    assert_eq!(ctx.run(&["LPOP", "k", "5"]).await, array_of_bulks(&["c"]));
    // Missing key with a count yields an empty array, not a null bulk.
    assert_eq!(ctx.run(&["LPOP", "k", "2"]).await, RespValue::Array(vec![]));
}

#[tokio::test]
async fn lpop_rejects_non_positive_count() {
    let mut ctx = TestContext::new();
    ctx.run(&["RPUSH", "k", "a"]).await;
    assert_eq!(
        ctx.dispatch(&["LPOP", "k", "0"]).await,
        Err(CitrineError::NotAnInteger)
    );
    assert_eq!(
        ctx.dispatch(&["LPOP", "k", "-3"]).await,
        Err(CitrineError::NotAnInteger)
    );
}

#[tokio::test]
async fn list_commands_reject_wrong_type() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "s", "v"]).await;
    assert_eq!(
        ctx.dispatch(&["RPUSH", "s", "a"]).await,
        Err(CitrineError::WrongType)
    );
    assert_eq!(
        ctx.dispatch(&["LRANGE", "s", "0", "-1"]).await,
        Err(CitrineError::WrongType)
    );
    assert_eq!(ctx.dispatch(&["LLEN", "s"]).await, Err(CitrineError::WrongType));
}
