// src/core/handler/command_router.rs

//! The central component for routing parsed commands to their handlers.
//!
//! `Router::route` is the single entry point shared by the live connection
//! loop and by `EXEC` replay. It enforces the subscribed-mode command
//! restriction, dispatches session-affecting commands (pub/sub,
//! transactions) to their actions, and executes everything else against the
//! shared state.

use super::{actions, transaction_handler};
use crate::connection::session::SessionState;
use crate::core::CitrineError;
use crate::core::commands::Command;
use crate::core::commands::command_trait::ExecutionContext;
use crate::core::protocol::RespValue;
use crate::core::state::ServerState;
use std::sync::Arc;
use tracing::debug;

/// The responses a routed command can produce.
pub enum RouteResponse {
    /// A single RESP value. This is the most common response type.
    Single(RespValue),
    /// Multiple RESP values, sent sequentially. Used by `SUBSCRIBE` and friends.
    Multiple(Vec<RespValue>),
}

/// The `Router` directs a parsed `Command` through the processing pipeline.
pub struct Router<'a> {
    state: Arc<ServerState>,
    session_id: u64,
    session: &'a mut SessionState,
}

impl<'a> Router<'a> {
    pub fn new(state: Arc<ServerState>, session_id: u64, session: &'a mut SessionState) -> Self {
        Self {
            state,
            session_id,
            session,
        }
    }

    /// Routes a command issued on the live connection.
    pub async fn route(&mut self, command: Command) -> Result<RouteResponse, CitrineError> {
        if self.session.in_subscribe_mode() && !command.is_allowed_while_subscribed() {
            return Err(CitrineError::SubscribedMode(command.name().to_uppercase()));
        }
        debug!("Session {}: routing {}", self.session_id, command.name());

        match command {
            Command::Multi => {
                transaction_handler::handle_multi(self.session).map(RouteResponse::Single)
            }
            Command::Discard => {
                transaction_handler::handle_discard(self.session).map(RouteResponse::Single)
            }
            Command::Exec => self.handle_exec().await.map(RouteResponse::Single),
            other => self.dispatch(other, false).await,
        }
    }

    /// `EXEC`: replays the queued frames through the dispatcher and collects
    /// every reply (including per-command errors) into one array. The outer
    /// EXEC never fails once a transaction is open.
    async fn handle_exec(&mut self) -> Result<RespValue, CitrineError> {
        let Some(frames) = transaction_handler::take_queue(self.session) else {
            return Err(CitrineError::ExecWithoutMulti);
        };

        let mut replies = Vec::with_capacity(frames.len());
        for frame in frames {
            match Command::try_from(frame) {
                Err(e) => replies.push(RespValue::Error(e.to_string())),
                Ok(command) => match self.dispatch(command, true).await {
                    Ok(RouteResponse::Single(value)) => replies.push(value),
                    Ok(RouteResponse::Multiple(values)) => replies.extend(values),
                    Err(e) => replies.push(RespValue::Error(e.to_string())),
                },
            }
        }
        Ok(RespValue::Array(replies))
    }

    /// Dispatches every command except the transaction controls, which the
    /// queueing rules keep out of the replay path.
    async fn dispatch(
        &mut self,
        command: Command,
        in_exec: bool,
    ) -> Result<RouteResponse, CitrineError> {
        match command {
            Command::Ping(ref cmd) => Ok(RouteResponse::Single(actions::handle_ping(
                cmd,
                self.session,
            ))),
            // QUIT replies +OK here; the connection layer closes the socket.
            Command::Quit => Ok(RouteResponse::Single(RespValue::ok())),

            Command::Subscribe(ref cmd) => {
                Ok(actions::handle_subscribe(cmd, self.session, &self.state))
            }
            Command::Unsubscribe(ref cmd) => {
                Ok(actions::handle_unsubscribe(cmd, self.session, &self.state))
            }
            Command::PSubscribe(ref cmd) => {
                Ok(actions::handle_psubscribe(cmd, self.session, &self.state))
            }
            Command::PUnsubscribe(ref cmd) => {
                Ok(actions::handle_punsubscribe(cmd, self.session, &self.state))
            }

            Command::Multi | Command::Exec | Command::Discard => Err(CitrineError::Internal(
                "transaction control escaped queueing rules".to_string(),
            )),

            data_command => {
                let mut ctx = ExecutionContext {
                    state: &self.state,
                    session_id: self.session_id,
                    in_exec,
                };
                data_command
                    .execute(&mut ctx)
                    .await
                    .map(RouteResponse::Single)
            }
        }
    }
}
