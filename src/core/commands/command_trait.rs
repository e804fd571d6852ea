// src/core/commands/command_trait.rs

//! Defines the core traits for all executable commands, plus the execution
//! context they run against.

use crate::core::protocol::{RespFrame, RespValue};
use crate::core::state::ServerState;
use crate::core::CitrineError;
use async_trait::async_trait;
use std::sync::Arc;

/// The context a command executes in: the shared server state plus the
/// identity of the issuing session.
pub struct ExecutionContext<'a> {
    pub state: &'a Arc<ServerState>,
    pub session_id: u64,
    /// True while `EXEC` replays a queued transaction. Blocking commands
    /// degrade to their non-blocking fast path.
    pub in_exec: bool,
}

/// A trait for the actual execution logic of a command.
/// Implemented by each command's struct (e.g., `Get`, `Set`).
#[async_trait]
pub trait ExecutableCommand {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError>;
}

/// A trait for parsing a command's arguments from a slice of `RespFrame`.
pub trait ParseCommand: Sized {
    /// Parses the arguments and returns an instance of the command struct.
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError>;
}
