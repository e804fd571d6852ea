// src/core/commands/streams/xadd.rs

//! Implements the `XADD` command for adding entries to a stream.
//!
//! `XADD key <* | ms-* | ms-seq> field value [field value ...]`
//!
//! On success the assigned id is returned as a bulk string. The append is
//! also the producer half of `XREAD BLOCK`: still inside the keyspace
//! critical section, the new entry is offered to the longest-waiting blocked
//! reader whose position predates it.

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use crate::core::storage::data_types::{DataValue, StoredValue};
use crate::core::storage::keyspace::Keyspace;
use crate::core::storage::stream::{IdSpec, Stream};
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;

/// Represents the `XADD` command.
#[derive(Debug, Clone)]
pub struct XAdd {
    pub key: Bytes,
    pub id_spec: IdSpec,
    pub fields: IndexMap<Bytes, Bytes>,
}

impl ParseCommand for XAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() < 4 {
            return Err(CitrineError::WrongArgumentCount("xadd".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let id_spec: IdSpec = extract_string(&args[1])?.parse()?;

        let field_args = &args[2..];
        if field_args.len() % 2 != 0 {
            return Err(CitrineError::WrongArgumentCount("xadd".to_string()));
        }
        let fields = field_args
            .chunks_exact(2)
            .map(|chunk| Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?)))
            .collect::<Result<_, CitrineError>>()?;

        Ok(XAdd { key, id_spec, fields })
    }
}

#[async_trait]
impl ExecutableCommand for XAdd {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let mut entries = ctx.state.keyspace.lock();

        let mut created = false;
        match Keyspace::live_entry_mut(&mut entries, &self.key) {
            Some(entry) if !matches!(entry.data, DataValue::Stream(_)) => {
                return Err(CitrineError::WrongType);
            }
            Some(_) => {}
            None => {
                entries.insert(
                    self.key.clone(),
                    StoredValue::new(DataValue::Stream(Stream::new())),
                );
                created = true;
            }
        }

        let Some(StoredValue {
            data: DataValue::Stream(stream),
            ..
        }) = entries.get_mut(&self.key)
        else {
            return Err(CitrineError::Internal("stream vanished under lock".into()));
        };

        match stream.add_entry(self.id_spec, self.fields.clone()) {
            Ok(id) => {
                // Wake a blocked XREAD client while the keyspace guard is
                // still held.
                if let Some(new_entry) = stream.entries.get(&id) {
                    ctx.state.stream_blocker_manager.notify(&self.key, new_entry);
                }
                Ok(RespValue::BulkString(id.to_string().into()))
            }
            Err(e) => {
                // A rejected id must not leave behind an empty stream key.
                if created {
                    entries.remove(&self.key);
                }
                Err(e)
            }
        }
    }
}
