// tests/integration/zset_commands_test.rs

//! Integration tests for sorted-set commands.

use super::test_helpers::{TestContext, array_of_bulks, bulk};
use citrinedb::core::CitrineError;
use citrinedb::core::protocol::RespValue;

#[tokio::test]
async fn zadd_returns_one_only_for_new_members() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["ZADD", "z", "1", "a"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(
        ctx.run(&["ZADD", "z", "2", "b"]).await,
        RespValue::Integer(1)
    );
    // Updating an existing member's score adds nothing.
    assert_eq!(
        ctx.run(&["ZADD", "z", "0", "a"]).await,
        RespValue::Integer(0)
    );
    assert_eq!(ctx.run(&["ZSCORE", "z", "a"]).await, bulk("0"));
}

#[tokio::test]
async fn zrange_orders_by_score_then_member() {
    let mut ctx = TestContext::new();
    ctx.run(&["ZADD", "z", "1", "a"]).await;
    ctx.run(&["ZADD", "z", "2", "b"]).await;
    assert_eq!(
        ctx.run(&["ZRANGE", "z", "0", "-1"]).await,
        array_of_bulks(&["a", "b"])
    );

    // Ties break lexicographically.
    ctx.run(&["ZADD", "z", "2", "aa"]).await;
    assert_eq!(
        ctx.run(&["ZRANGE", "z", "0", "-1"]).await,
        array_of_bulks(&["a", "aa", "b"])
    );
    assert_eq!(
        ctx.run(&["ZRANGE", "z", "-2", "-1"]).await,
        array_of_bulks(&["aa", "b"])
    );
    assert_eq!(
        ctx.run(&["ZRANGE", "missing", "0", "-1"]).await,
        RespValue::Array(vec![])
    );
}

#[tokio::test]
async fn zrank_is_zero_based_or_null() {
    let mut ctx = TestContext::new();
    ctx.run(&["ZADD", "z", "10", "low"]).await;
    ctx.run(&["ZADD", "z", "20", "high"]).await;
    assert_eq!(ctx.run(&["ZRANK", "z", "low"]).await, RespValue::Integer(0));
    assert_eq!(ctx.run(&["ZRANK", "z", "high"]).await, RespValue::Integer(1));
    assert_eq!(ctx.run(&["ZRANK", "z", "missing"]).await, RespValue::Null);
    assert_eq!(ctx.run(&["ZRANK", "nokey", "m"]).await, RespValue::Null);
}

#[tokio::test]
async fn zscore_formats_scores() {
    let mut ctx = TestContext::new();
    ctx.run(&["ZADD", "z", "3.5", "m"]).await;
    assert_eq!(ctx.run(&["ZSCORE", "z", "m"]).await, bulk("3.5"));
    ctx.run(&["ZADD", "z", "inf", "big"]).await;
    assert_eq!(ctx.run(&["ZSCORE", "z", "big"]).await, bulk("inf"));
    assert_eq!(ctx.run(&["ZSCORE", "z", "missing"]).await, RespValue::Null);
}

#[tokio::test]
async fn zadd_rejects_non_float_scores() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.dispatch(&["ZADD", "z", "heavy", "m"]).await,
        Err(CitrineError::NotAFloat)
    );
}

#[tokio::test]
async fn zrem_and_zcard_track_cardinality() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.run(&["ZCARD", "z"]).await, RespValue::Integer(0));
    ctx.run(&["ZADD", "z", "1", "a"]).await;
    ctx.run(&["ZADD", "z", "2", "b"]).await;
    assert_eq!(ctx.run(&["ZCARD", "z"]).await, RespValue::Integer(2));

    assert_eq!(ctx.run(&["ZREM", "z", "a"]).await, RespValue::Integer(1));
    assert_eq!(ctx.run(&["ZREM", "z", "a"]).await, RespValue::Integer(0));
    assert_eq!(ctx.run(&["ZCARD", "z"]).await, RespValue::Integer(1));

    // Removing the last member removes the key itself.
    ctx.run(&["ZREM", "z", "b"]).await;
    assert_eq!(ctx.run(&["TYPE", "z"]).await, RespValue::SimpleString("none".into()));
}

#[tokio::test]
async fn zset_commands_reject_wrong_type() {
    let mut ctx = TestContext::new();
    ctx.run(&["SET", "s", "v"]).await;
    assert_eq!(
        ctx.dispatch(&["ZADD", "s", "1", "m"]).await,
        Err(CitrineError::WrongType)
    );
    assert_eq!(
        ctx.dispatch(&["ZCARD", "s"]).await,
        Err(CitrineError::WrongType)
    );
}
