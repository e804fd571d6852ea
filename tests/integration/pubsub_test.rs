// tests/integration/pubsub_test.rs

//! Integration tests for publish/subscribe and the subscribed-mode
//! command restriction.

use super::test_helpers::{TestContext, bulk};
use citrinedb::core::CitrineError;
use citrinedb::core::protocol::RespValue;

#[tokio::test]
async fn subscribe_confirms_with_count() {
    let mut ctx = TestContext::new();
    assert_eq!(
        ctx.run(&["SUBSCRIBE", "ch"]).await,
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("subscribe"),
            bulk("ch"),
            RespValue::Integer(1),
        ])])
    );
    assert!(ctx.session.in_subscribe_mode());

    // A second channel bumps the count.
    assert_eq!(
        ctx.run(&["SUBSCRIBE", "other"]).await,
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("subscribe"),
            bulk("other"),
            RespValue::Integer(2),
        ])])
    );
}

#[tokio::test]
async fn publish_reaches_subscribers_and_counts_them() {
    let mut subscriber = TestContext::new();
    subscriber.run(&["SUBSCRIBE", "ch"]).await;

    let mut publisher = TestContext::with_state(subscriber.state.clone(), 2);
    assert_eq!(
        publisher.run(&["PUBLISH", "ch", "hi"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(
        publisher.run(&["PUBLISH", "nobody", "hi"]).await,
        RespValue::Integer(0)
    );
}

#[tokio::test]
async fn subscribed_mode_restricts_commands() {
    let mut ctx = TestContext::new();
    ctx.run(&["SUBSCRIBE", "ch"]).await;

    assert_eq!(
        ctx.dispatch(&["SET", "x", "1"]).await,
        Err(CitrineError::SubscribedMode("SET".to_string()))
    );
    assert_eq!(
        ctx.dispatch(&["MULTI"]).await,
        Err(CitrineError::SubscribedMode("MULTI".to_string()))
    );

    // PING is permitted, with the array-form reply.
    assert_eq!(
        ctx.run(&["PING"]).await,
        RespValue::Array(vec![bulk("pong"), bulk("")])
    );
}

#[tokio::test]
async fn unsubscribe_clears_subscribed_mode() {
    let mut ctx = TestContext::new();
    ctx.run(&["SUBSCRIBE", "a", "b"]).await;
    assert!(ctx.session.in_subscribe_mode());

    ctx.run(&["UNSUBSCRIBE", "a"]).await;
    assert!(ctx.session.in_subscribe_mode());

    // No arguments: drop every remaining subscription.
    ctx.run(&["UNSUBSCRIBE"]).await;
    assert!(!ctx.session.in_subscribe_mode());

    // Normal commands work again.
    assert_eq!(
        ctx.run(&["SET", "x", "1"]).await,
        RespValue::SimpleString("OK".into())
    );
}

#[tokio::test]
async fn psubscribe_matches_patterns() {
    let mut subscriber = TestContext::new();
    assert_eq!(
        subscriber.run(&["PSUBSCRIBE", "news.*"]).await,
        RespValue::Array(vec![RespValue::Array(vec![
            bulk("psubscribe"),
            bulk("news.*"),
            RespValue::Integer(1),
        ])])
    );

    let mut publisher = TestContext::with_state(subscriber.state.clone(), 2);
    assert_eq!(
        publisher.run(&["PUBLISH", "news.tech", "m"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(
        publisher.run(&["PUBLISH", "weather.tech", "m"]).await,
        RespValue::Integer(0)
    );
}
