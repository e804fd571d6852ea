// src/core/commands/streams/mod.rs

pub mod xadd;
pub mod xrange;
pub mod xread;

pub use xadd::XAdd;
pub use xrange::XRange;
pub use xread::XRead;

use crate::core::protocol::RespValue;
use crate::core::storage::stream::StreamEntry;

/// Serialises a stream entry as `[id, [field, value, ...]]`.
pub(crate) fn entry_to_resp(entry: &StreamEntry) -> RespValue {
    let mut fields = Vec::with_capacity(entry.fields.len() * 2);
    for (field, value) in &entry.fields {
        fields.push(RespValue::BulkString(field.clone()));
        fields.push(RespValue::BulkString(value.clone()));
    }
    RespValue::Array(vec![
        RespValue::BulkString(entry.id.to_string().into()),
        RespValue::Array(fields),
    ])
}
