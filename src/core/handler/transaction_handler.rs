// src/core/handler/transaction_handler.rs

//! Manages the MULTI/EXEC transaction state machine for a single client
//! session. The queue holds raw request frames; they are parsed only when
//! `EXEC` replays them, so queue-time garbage surfaces as an error embedded
//! in the reply array rather than aborting the transaction.

use crate::connection::session::SessionState;
use crate::core::CitrineError;
use crate::core::protocol::{RespFrame, RespValue};

/// The commands that are *not* queued while a transaction is open.
pub fn is_transaction_control(command_name: &str) -> bool {
    matches!(command_name, "MULTI" | "EXEC" | "DISCARD" | "QUIT")
}

/// `MULTI`: opens a transaction. Nesting is an error.
pub fn handle_multi(session: &mut SessionState) -> Result<RespValue, CitrineError> {
    if session.is_in_transaction {
        return Err(CitrineError::NestedMulti);
    }
    session.is_in_transaction = true;
    session.queued_frames.clear();
    Ok(RespValue::ok())
}

/// Queues a raw request frame and acknowledges with `+QUEUED`.
pub fn queue_frame(session: &mut SessionState, frame: RespFrame) -> RespValue {
    session.queued_frames.push(frame);
    RespValue::SimpleString("QUEUED".into())
}

/// `DISCARD`: closes the transaction and drops the queue.
pub fn handle_discard(session: &mut SessionState) -> Result<RespValue, CitrineError> {
    if !session.is_in_transaction {
        return Err(CitrineError::DiscardWithoutMulti);
    }
    session.is_in_transaction = false;
    session.queued_frames.clear();
    Ok(RespValue::ok())
}

/// `EXEC` entry: closes the transaction and hands back the queued frames for
/// replay. `None` means there was no open transaction.
pub fn take_queue(session: &mut SessionState) -> Option<Vec<RespFrame>> {
    if !session.is_in_transaction {
        return None;
    }
    session.is_in_transaction = false;
    Some(std::mem::take(&mut session.queued_frames))
}
