// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a
//! client connection: one frame in, one reply out, strictly in order.

use super::guard::ConnectionGuard;
use super::session::SessionState;
use crate::core::commands::{Command, frame_command_name};
use crate::core::handler::{RouteResponse, Router, transaction_handler};
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::pubsub::handler::{PubSubExit, PubSubModeHandler};
use crate::core::state::ServerState;
use crate::core::CitrineError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// The next step for the connection's main loop to take.
enum NextAction {
    Continue,
    EnterPubSub,
    ExitLoop,
}

/// Manages the full lifecycle of a client connection.
pub struct ConnectionHandler {
    framed: Framed<TcpStream, RespFrameCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: u64,
    shutdown_rx: broadcast::Receiver<()>,
    session: SessionState,
}

impl ConnectionHandler {
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            framed: Framed::new(socket, RespFrameCodec),
            addr,
            state,
            session_id,
            shutdown_rx,
            session: SessionState::new(),
        }
    }

    /// The main event loop for the connection.
    pub async fn run(&mut self) -> Result<(), CitrineError> {
        let _guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);
        'main_loop: loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => {
                    debug!("Connection handler for {} received shutdown signal", self.addr);
                    break 'main_loop;
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            match self.process_frame(frame).await {
                                Ok(NextAction::Continue) => {}
                                Ok(NextAction::EnterPubSub) => {
                                    let mut pubsub_handler = PubSubModeHandler::new(
                                        &mut self.framed,
                                        &mut self.session,
                                        self.state.clone(),
                                        self.session_id,
                                    );
                                    match pubsub_handler.run().await {
                                        Ok(PubSubExit::Resume) => {}
                                        Ok(PubSubExit::Close) | Err(_) => break 'main_loop,
                                    }
                                }
                                Ok(NextAction::ExitLoop) => break 'main_loop,
                                Err(e) => {
                                    // Malformed frames and IO failures close
                                    // the connection silently.
                                    debug!("Fatal connection error for {}: {}", self.addr, e);
                                    break 'main_loop;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!("Connection from {} closed by peer: {}", self.addr, e);
                            } else {
                                warn!("Connection error for {}: {}", self.addr, e);
                            }
                            break 'main_loop;
                        }
                        None => {
                            debug!("Connection from {} closed by peer", self.addr);
                            break 'main_loop;
                        }
                    }
                }
            }
        }

        // Drop subscription receivers before the guard purges empty
        // channels on its way out.
        self.session.pubsub_receivers.clear();
        self.session.subscribed_channels.clear();
        self.session.subscribed_patterns.clear();
        Ok(())
    }

    /// Handles one request frame: transaction queue interception first, then
    /// parse, route, reply. Errors returned from here are fatal; command
    /// errors are sent as RESP error replies.
    async fn process_frame(&mut self, frame: RespFrame) -> Result<NextAction, CitrineError> {
        // In MULTI mode everything except the control commands queues as-is.
        if self.session.is_in_transaction {
            let intercept = frame_command_name(&frame)
                .is_some_and(|name| !transaction_handler::is_transaction_control(&name));
            if intercept {
                let reply = transaction_handler::queue_frame(&mut self.session, frame);
                self.framed.send(reply.into()).await?;
                return Ok(NextAction::Continue);
            }
        }

        let command = match Command::try_from(frame) {
            Ok(command) => command,
            // Frames that are not arrays of bulk strings are fatal.
            Err(e @ CitrineError::ProtocolError(_)) => return Err(e),
            Err(e) => {
                self.framed.send(RespFrame::Error(e.to_string())).await?;
                return Ok(NextAction::Continue);
            }
        };
        debug!("Session {}: received command {}", self.session_id, command.name());

        let is_quit = matches!(command, Command::Quit);
        let mut router = Router::new(self.state.clone(), self.session_id, &mut self.session);
        match router.route(command).await {
            Ok(RouteResponse::Single(value)) => {
                self.framed.send(value.into()).await?;
            }
            Ok(RouteResponse::Multiple(values)) => {
                for value in values {
                    self.framed.send(value.into()).await?;
                }
            }
            Err(e) => {
                self.framed.send(RespFrame::Error(e.to_string())).await?;
            }
        }

        if is_quit {
            // QUIT closes the connection after its +OK, in any state.
            Ok(NextAction::ExitLoop)
        } else if self.session.in_subscribe_mode() {
            Ok(NextAction::EnterPubSub)
        } else {
            Ok(NextAction::Continue)
        }
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &CitrineError) -> bool {
    matches!(e, CitrineError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
