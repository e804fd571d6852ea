// src/core/handler/actions.rs

//! Command handlers that mutate per-session state: PING's mode-dependent
//! reply and the four (un)subscribe operations.

use crate::connection::session::{SessionState, SubscriptionReceiver};
use crate::core::commands::generic::{PSubscribe, PUnsubscribe, Ping, Subscribe, Unsubscribe};
use crate::core::handler::command_router::RouteResponse;
use crate::core::protocol::RespValue;
use crate::core::state::ServerState;
use bytes::Bytes;
use tracing::debug;

/// `PING` replies `+PONG` (or the message as a bulk string), except in
/// subscribed mode where it becomes the `["pong", message]` array.
pub fn handle_ping(cmd: &Ping, session: &SessionState) -> RespValue {
    if session.in_subscribe_mode() {
        RespValue::Array(vec![
            RespValue::BulkString("pong".into()),
            RespValue::BulkString(cmd.message.clone().unwrap_or_default()),
        ])
    } else {
        match &cmd.message {
            Some(message) => RespValue::BulkString(message.clone()),
            None => RespValue::SimpleString("PONG".into()),
        }
    }
}

/// `SUBSCRIBE`: one confirmation array per channel, each carrying the
/// subscription count after that channel was added.
pub fn handle_subscribe(
    cmd: &Subscribe,
    session: &mut SessionState,
    state: &ServerState,
) -> RouteResponse {
    let mut replies = Vec::with_capacity(cmd.channels.len());
    for channel in &cmd.channels {
        if session.subscribed_channels.insert(channel.clone()) {
            let rx = state.pubsub.subscribe(channel);
            session
                .pubsub_receivers
                .push(SubscriptionReceiver::Channel(channel.clone(), rx));
            debug!("Subscribed to channel {channel:?}");
        }
        replies.push(confirmation("subscribe", Some(channel.clone()), session));
    }
    RouteResponse::Multiple(replies)
}

/// `UNSUBSCRIBE`: with no channels given, drops every channel subscription.
pub fn handle_unsubscribe(
    cmd: &Unsubscribe,
    session: &mut SessionState,
    state: &ServerState,
) -> RouteResponse {
    let channels: Vec<Bytes> = if cmd.channels.is_empty() {
        session.subscribed_channels.iter().cloned().collect()
    } else {
        cmd.channels.clone()
    };

    if channels.is_empty() {
        // Not subscribed to anything; a single confirmation with no channel.
        return RouteResponse::Multiple(vec![confirmation("unsubscribe", None, session)]);
    }

    let mut replies = Vec::with_capacity(channels.len());
    for channel in channels {
        session.subscribed_channels.remove(&channel);
        session.pubsub_receivers.retain(
            |receiver| !matches!(receiver, SubscriptionReceiver::Channel(name, _) if *name == channel),
        );
        replies.push(confirmation("unsubscribe", Some(channel), session));
    }
    // Dropping the receivers may have emptied broadcast channels.
    state.pubsub.purge_empty_channels();
    RouteResponse::Multiple(replies)
}

/// `PSUBSCRIBE`: pattern variant of `SUBSCRIBE`.
pub fn handle_psubscribe(
    cmd: &PSubscribe,
    session: &mut SessionState,
    state: &ServerState,
) -> RouteResponse {
    let mut replies = Vec::with_capacity(cmd.patterns.len());
    for pattern in &cmd.patterns {
        if session.subscribed_patterns.insert(pattern.clone()) {
            let rx = state.pubsub.subscribe_pattern(pattern);
            session
                .pubsub_receivers
                .push(SubscriptionReceiver::Pattern(pattern.clone(), rx));
            debug!("Subscribed to pattern {pattern:?}");
        }
        replies.push(confirmation("psubscribe", Some(pattern.clone()), session));
    }
    RouteResponse::Multiple(replies)
}

/// `PUNSUBSCRIBE`: pattern variant of `UNSUBSCRIBE`.
pub fn handle_punsubscribe(
    cmd: &PUnsubscribe,
    session: &mut SessionState,
    state: &ServerState,
) -> RouteResponse {
    let patterns: Vec<Bytes> = if cmd.patterns.is_empty() {
        session.subscribed_patterns.iter().cloned().collect()
    } else {
        cmd.patterns.clone()
    };

    if patterns.is_empty() {
        return RouteResponse::Multiple(vec![confirmation("punsubscribe", None, session)]);
    }

    let mut replies = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        session.subscribed_patterns.remove(&pattern);
        session.pubsub_receivers.retain(
            |receiver| !matches!(receiver, SubscriptionReceiver::Pattern(name, _) if *name == pattern),
        );
        replies.push(confirmation("punsubscribe", Some(pattern), session));
    }
    state.pubsub.purge_empty_channels();
    RouteResponse::Multiple(replies)
}

/// The `["<kind>", channel|nil, count]` confirmation array.
fn confirmation(kind: &str, channel: Option<Bytes>, session: &SessionState) -> RespValue {
    RespValue::Array(vec![
        RespValue::BulkString(kind.to_string().into()),
        match channel {
            Some(channel) => RespValue::BulkString(channel),
            None => RespValue::Null,
        },
        RespValue::Integer(session.subscription_count() as i64),
    ])
}
