// src/server/mod.rs

//! Contains the main server loop: state initialization, snapshot loading,
//! the TCP accept loop and graceful shutdown.

use crate::config::Config;
use crate::connection::ConnectionHandler;
use crate::core::persistence::rdb;
use crate::core::state::ServerState;
use crate::core::storage::Keyspace;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// The main server startup function. Returns once a shutdown signal has been
/// handled; a bind or snapshot failure is a startup error.
pub async fn run(config: Config) -> Result<()> {
    // Hand the core a populated keyspace before accepting connections.
    let contents = rdb::load_keyspace_contents(&config)
        .with_context(|| format!("failed to load RDB file {}", config.rdb_path().display()))?;
    let keyspace = Keyspace::from_entries(contents);

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("CitrineDB listening on {addr}");
    if let Some(replicaof) = &config.replicaof {
        info!(
            "Configured as replica of {}:{} (replication not active)",
            replicaof.host, replicaof.port
        );
    }

    let state = Arc::new(ServerState::new(config, keyspace));
    let (shutdown_tx, _) = broadcast::channel(1);
    let mut client_tasks = JoinSet::new();
    let mut session_id_counter: u64 = 0;

    loop {
        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }

            res = listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        session_id_counter = session_id_counter.wrapping_add(1);
                        let session_id = session_id_counter;
                        info!("Accepted new connection from {addr} (session {session_id})");

                        let state = state.clone();
                        let shutdown_rx = shutdown_tx.subscribe();
                        client_tasks.spawn(async move {
                            let mut handler =
                                ConnectionHandler::new(socket, addr, state, session_id, shutdown_rx);
                            if let Err(e) = handler.run().await {
                                warn!("Connection from {addr} terminated unexpectedly: {e}");
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {e}"),
                }
            }

            // Reap completed client tasks.
            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            }
        }
    }

    // --- Graceful shutdown ---
    info!("Shutting down; signalling {} client task(s)", client_tasks.len());
    let _ = shutdown_tx.send(());
    client_tasks.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
