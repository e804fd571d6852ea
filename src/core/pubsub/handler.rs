// src/core/pubsub/handler.rs

//! Handles a client connection that has entered Pub/Sub mode.
//!
//! In this mode the connection multiplexes two sources: broadcast messages
//! from subscribed channels/patterns, and incoming frames — restricted to
//! the pub/sub-adjacent command set plus `PING`/`QUIT` by the router.

use crate::connection::session::{SessionState, SubscriptionReceiver};
use crate::core::CitrineError;
use crate::core::commands::Command;
use crate::core::handler::{RouteResponse, Router};
use crate::core::protocol::{RespFrame, RespFrameCodec, RespValue};
use crate::core::state::ServerState;
use futures::{SinkExt, StreamExt, future::FutureExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// How the Pub/Sub loop ended.
pub enum PubSubExit {
    /// All subscriptions dropped; resume the normal command loop.
    Resume,
    /// The peer quit or the connection failed; close it.
    Close,
}

/// Manages a connection while it is in Pub/Sub mode.
pub struct PubSubModeHandler<'a, S: AsyncRead + AsyncWrite + Unpin> {
    framed: &'a mut Framed<S, RespFrameCodec>,
    session: &'a mut SessionState,
    state: Arc<ServerState>,
    session_id: u64,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> PubSubModeHandler<'a, S> {
    pub fn new(
        framed: &'a mut Framed<S, RespFrameCodec>,
        session: &'a mut SessionState,
        state: Arc<ServerState>,
        session_id: u64,
    ) -> Self {
        Self {
            framed,
            session,
            state,
            session_id,
        }
    }

    /// Runs until the client unsubscribes from everything, quits, or the
    /// connection drops.
    pub async fn run(&mut self) -> Result<PubSubExit, CitrineError> {
        debug!("Session {}: entering Pub/Sub mode loop", self.session_id);
        loop {
            if !self.session.in_subscribe_mode() {
                debug!("Session {}: no more subscriptions, exiting Pub/Sub mode", self.session_id);
                return Ok(PubSubExit::Resume);
            }

            tokio::select! {
                maybe_msg = receive_pubsub_message(&mut self.session.pubsub_receivers) => {
                    match maybe_msg {
                        Ok(frame) => {
                            if self.framed.send(frame).await.is_err() {
                                warn!("Failed to forward pubsub message; connection likely closed");
                                return Ok(PubSubExit::Close);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // The receiver fell behind. Re-subscribe for a
                            // fresh cursor and keep going.
                            warn!("Pub/Sub receiver lagged, missed {missed} messages; re-subscribing");
                            self.resubscribe_all();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("A Pub/Sub broadcast channel was closed; exiting pub/sub mode");
                            return Ok(PubSubExit::Close);
                        }
                    }
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            if let PubSubExit::Close = self.process_frame(frame).await? {
                                return Ok(PubSubExit::Close);
                            }
                        }
                        Some(Err(_)) | None => return Ok(PubSubExit::Close),
                    }
                }
            }
        }
    }

    /// Processes one command frame while subscribed. The router enforces the
    /// reduced command surface.
    async fn process_frame(&mut self, frame: RespFrame) -> Result<PubSubExit, CitrineError> {
        let command = match Command::try_from(frame) {
            Ok(command) => command,
            Err(e @ CitrineError::ProtocolError(_)) => return Err(e),
            Err(e) => {
                self.framed.send(RespFrame::Error(e.to_string())).await?;
                return Ok(PubSubExit::Resume);
            }
        };

        let is_quit = matches!(command, Command::Quit);
        let mut router = Router::new(self.state.clone(), self.session_id, self.session);
        match router.route(command).await {
            Ok(RouteResponse::Single(value)) => self.framed.send(value.into()).await?,
            Ok(RouteResponse::Multiple(values)) => {
                for value in values {
                    self.framed.send(value.into()).await?;
                }
            }
            Err(e) => self.framed.send(RespFrame::Error(e.to_string())).await?,
        }

        if is_quit {
            return Ok(PubSubExit::Close);
        }
        Ok(PubSubExit::Resume)
    }

    /// Re-subscribes to every channel and pattern after a lagged receiver.
    fn resubscribe_all(&mut self) {
        let old_receivers = std::mem::take(&mut self.session.pubsub_receivers);
        for receiver in old_receivers {
            match receiver {
                SubscriptionReceiver::Channel(name, _) => {
                    let rx = self.state.pubsub.subscribe(&name);
                    self.session
                        .pubsub_receivers
                        .push(SubscriptionReceiver::Channel(name, rx));
                }
                SubscriptionReceiver::Pattern(pattern, _) => {
                    let rx = self.state.pubsub.subscribe_pattern(&pattern);
                    self.session
                        .pubsub_receivers
                        .push(SubscriptionReceiver::Pattern(pattern, rx));
                }
            }
        }
    }
}

/// Waits for a message from any of the subscription receivers and formats it
/// as the client-facing `message`/`pmessage` array. Pends forever when there
/// are no receivers (the caller's other select arm still makes progress).
async fn receive_pubsub_message(
    pubsub_receivers: &mut [SubscriptionReceiver],
) -> Result<RespFrame, broadcast::error::RecvError> {
    if pubsub_receivers.is_empty() {
        return futures::future::pending().await;
    }

    let select_all = futures::future::select_all(pubsub_receivers.iter_mut().map(|receiver| {
        async move {
            match receiver {
                SubscriptionReceiver::Channel(name, rx) => rx.recv().await.map(|msg| {
                    RespValue::Array(vec![
                        RespValue::BulkString("message".into()),
                        RespValue::BulkString(name.clone()),
                        RespValue::BulkString(msg),
                    ])
                }),
                SubscriptionReceiver::Pattern(pattern, rx) => {
                    rx.recv().await.map(|(channel, msg)| {
                        RespValue::Array(vec![
                            RespValue::BulkString("pmessage".into()),
                            RespValue::BulkString(pattern.clone()),
                            RespValue::BulkString(channel),
                            RespValue::BulkString(msg),
                        ])
                    })
                }
            }
        }
        .boxed()
    }));

    let (recv_result, _index, _remaining) = select_all.await;
    recv_result.map(Into::into)
}
