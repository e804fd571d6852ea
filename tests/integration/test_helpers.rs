// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests.

use bytes::Bytes;
use citrinedb::config::Config;
use citrinedb::connection::SessionState;
use citrinedb::core::commands::Command;
use citrinedb::core::handler::{RouteResponse, Router, transaction_handler};
use citrinedb::core::commands::frame_command_name;
use citrinedb::core::protocol::{RespFrame, RespValue};
use citrinedb::core::state::ServerState;
use citrinedb::core::storage::Keyspace;
use citrinedb::core::CitrineError;
use std::sync::Arc;

/// A test client: a session plus a handle to (possibly shared) server state.
pub struct TestContext {
    pub state: Arc<ServerState>,
    pub session: SessionState,
    pub session_id: u64,
}

impl TestContext {
    /// Creates a fresh server state with a single client session.
    pub fn new() -> Self {
        let state = Arc::new(ServerState::new(Config::default(), Keyspace::new()));
        Self::with_state(state, 1)
    }

    /// Attaches another client session to an existing server state.
    pub fn with_state(state: Arc<ServerState>, session_id: u64) -> Self {
        Self {
            state,
            session: SessionState::new(),
            session_id,
        }
    }

    /// Dispatches a command the way the connection loop does, including the
    /// transaction queue-time interception.
    pub async fn dispatch(&mut self, parts: &[&str]) -> Result<RespValue, CitrineError> {
        let frame = command_frame(parts);

        if self.session.is_in_transaction {
            let intercept = frame_command_name(&frame)
                .is_some_and(|name| !transaction_handler::is_transaction_control(&name));
            if intercept {
                return Ok(transaction_handler::queue_frame(&mut self.session, frame));
            }
        }

        let command = Command::try_from(frame)?;
        let mut router = Router::new(self.state.clone(), self.session_id, &mut self.session);
        match router.route(command).await? {
            RouteResponse::Single(value) => Ok(value),
            RouteResponse::Multiple(values) => Ok(RespValue::Array(values)),
        }
    }

    /// Dispatches and unwraps, for commands the test expects to succeed.
    pub async fn run(&mut self, parts: &[&str]) -> RespValue {
        self.dispatch(parts).await.expect("command failed")
    }
}

/// Builds a request frame (array of bulk strings) from string parts.
pub fn command_frame(parts: &[&str]) -> RespFrame {
    RespFrame::Array(
        parts
            .iter()
            .map(|part| RespFrame::BulkString(Bytes::from(part.to_string())))
            .collect(),
    )
}

/// Shorthand constructors for expected replies.
pub fn bulk(s: &str) -> RespValue {
    RespValue::BulkString(Bytes::from(s.to_string()))
}

pub fn array_of_bulks(items: &[&str]) -> RespValue {
    RespValue::Array(items.iter().map(|item| bulk(item)).collect())
}
