// src/core/commands/streams/xread.rs

//! Implements `XREAD [BLOCK ms] STREAMS key [key ...] id [id ...]`.
//!
//! The non-blocking form returns, for every key that has entries strictly
//! newer than its id, a `[key, [entries...]]` pair — or a null array when no
//! key qualifies. With `BLOCK` (single key only) the client suspends until a
//! producer delivers a newer entry or the timeout elapses. The special id
//! `$` resolves to the stream's current maximum at call time.

use super::entry_to_resp;
use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use crate::core::storage::data_types::DataValue;
use crate::core::storage::keyspace::Keyspace;
use crate::core::storage::stream::StreamId;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// The id argument of one stream: explicit, or `$` for "whatever the stream's
/// newest entry is right now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFrom {
    Latest,
    After(StreamId),
}

/// Represents the `XREAD` command.
#[derive(Debug, Clone, Default)]
pub struct XRead {
    /// `None`: non-blocking. `Some(None)`: block forever. `Some(Some(d))`:
    /// block up to `d`.
    pub block: Option<Option<Duration>>,
    pub streams: Vec<(Bytes, ReadFrom)>,
}

impl ParseCommand for XRead {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.is_empty() {
            return Err(CitrineError::WrongArgumentCount("xread".to_string()));
        }

        let mut block = None;
        let mut i = 0;
        if extract_string(&args[i])?.eq_ignore_ascii_case("block") {
            let ms: u64 = args
                .get(i + 1)
                .ok_or(CitrineError::SyntaxError)
                .and_then(|frame| {
                    extract_string(frame)?
                        .parse()
                        .map_err(|_| CitrineError::NotAnInteger)
                })?;
            block = Some(if ms == 0 {
                None
            } else {
                Some(Duration::from_millis(ms))
            });
            i += 2;
        }

        if !args
            .get(i)
            .is_some_and(|frame| matches!(extract_string(frame), Ok(s) if s.eq_ignore_ascii_case("streams")))
        {
            return Err(CitrineError::SyntaxError);
        }
        i += 1;

        let rest = &args[i..];
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CitrineError::SyntaxError);
        }
        let (keys, ids) = rest.split_at(rest.len() / 2);

        // Blocking reads support one stream at a time.
        if block.is_some() && keys.len() != 1 {
            return Err(CitrineError::SyntaxError);
        }

        let streams = keys
            .iter()
            .zip(ids)
            .map(|(key, id)| {
                let key = extract_bytes(key)?;
                let id = extract_string(id)?;
                let read_from = if id == "$" {
                    ReadFrom::Latest
                } else {
                    ReadFrom::After(id.parse()?)
                };
                Ok((key, read_from))
            })
            .collect::<Result<_, CitrineError>>()?;

        Ok(XRead { block, streams })
    }
}

#[async_trait]
impl ExecutableCommand for XRead {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        // Fast path (and waiter registration) under the keyspace guard.
        let (wait_key, waiter, wait_timeout) = {
            let mut entries = ctx.state.keyspace.lock();

            // Resolve `$` against the current stream tops, checking types.
            let mut resolved = Vec::with_capacity(self.streams.len());
            for (key, read_from) in &self.streams {
                let last_id = match Keyspace::live_entry_mut(&mut entries, key) {
                    None => StreamId::MIN,
                    Some(entry) => match &entry.data {
                        DataValue::Stream(stream) => stream.last_id,
                        _ => return Err(CitrineError::WrongType),
                    },
                };
                let after = match read_from {
                    ReadFrom::Latest => last_id,
                    ReadFrom::After(id) => *id,
                };
                resolved.push((key.clone(), after));
            }

            let mut results = Vec::new();
            for (key, after) in &resolved {
                if let Some(entry) = Keyspace::live_entry_mut(&mut entries, key)
                    && let DataValue::Stream(stream) = &entry.data
                {
                    let newer = stream.entries_after(*after);
                    if !newer.is_empty() {
                        results.push(RespValue::Array(vec![
                            RespValue::BulkString(key.clone()),
                            RespValue::Array(newer.into_iter().map(entry_to_resp).collect()),
                        ]));
                    }
                }
            }
            if !results.is_empty() {
                return Ok(RespValue::Array(results));
            }

            // No data. Blocking degrades to non-blocking inside EXEC replay.
            let Some(wait_timeout) = self.block else {
                return Ok(RespValue::NullArray);
            };
            if ctx.in_exec {
                return Ok(RespValue::NullArray);
            }

            // Parse guarantees a single key on the blocking path. Register
            // before the keyspace guard is released.
            let (key, after) = resolved[0].clone();
            let waiter = ctx
                .state
                .stream_blocker_manager
                .register(&key, ctx.session_id, after);
            (key, waiter, wait_timeout)
        };

        match ctx
            .state
            .stream_blocker_manager
            .wait(&wait_key, waiter, wait_timeout)
            .await
        {
            Some(entry) => Ok(RespValue::Array(vec![RespValue::Array(vec![
                RespValue::BulkString(wait_key),
                RespValue::Array(vec![entry_to_resp(&entry)]),
            ])])),
            None => Ok(RespValue::NullArray),
        }
    }
}
