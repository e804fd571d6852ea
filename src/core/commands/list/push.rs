// src/core/commands/list/push.rs

//! Implements `LPUSH` and `RPUSH`. The push side is also the producer half
//! of `BLPOP`: after appending, and still inside the keyspace critical
//! section, it offers the head element to the longest-waiting blocked
//! client.

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::parse_key_and_values;
use crate::core::protocol::{RespFrame, RespValue};
use crate::core::storage::keyspace::Keyspace;
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDirection {
    Left,
    Right,
}

/// Represents the `LPUSH` command.
#[derive(Debug, Clone, Default)]
pub struct LPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

/// Represents the `RPUSH` command.
#[derive(Debug, Clone, Default)]
pub struct RPush {
    pub key: Bytes,
    pub values: Vec<Bytes>,
}

impl ParseCommand for LPush {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        let (key, values) = parse_key_and_values(args, 2, "lpush")?;
        Ok(LPush { key, values })
    }
}

impl ParseCommand for RPush {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        let (key, values) = parse_key_and_values(args, 2, "rpush")?;
        Ok(RPush { key, values })
    }
}

/// Shared push logic. Returns the length immediately after insertion — the
/// pusher's reply does not shrink even when a waiter consumes the element
/// right away.
fn push_logic(
    ctx: &mut ExecutionContext<'_>,
    key: &Bytes,
    values: &[Bytes],
    direction: PushDirection,
) -> Result<RespValue, CitrineError> {
    let mut entries = ctx.state.keyspace.lock();
    let list = Keyspace::list_entry_mut(&mut entries, key)?;
    for value in values {
        match direction {
            PushDirection::Left => list.push_front(value.clone()),
            PushDirection::Right => list.push_back(value.clone()),
        }
    }
    let length = list.len();

    // Hand off to a blocked BLPOP client while the keyspace guard is still
    // held, so no other writer can slip between append and delivery.
    ctx.state.blocker_manager.notify_and_serve_push(key, list);
    Keyspace::drop_if_empty_list(&mut entries, key);

    Ok(RespValue::Integer(length as i64))
}

#[async_trait]
impl ExecutableCommand for LPush {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        push_logic(ctx, &self.key, &self.values, PushDirection::Left)
    }
}

#[async_trait]
impl ExecutableCommand for RPush {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        push_logic(ctx, &self.key, &self.values, PushDirection::Right)
    }
}
