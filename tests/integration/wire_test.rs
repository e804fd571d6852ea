// tests/integration/wire_test.rs

//! Socket-level tests: real TCP connections against real connection
//! handlers, asserting the exact RESP bytes on the wire.

use citrinedb::config::Config;
use citrinedb::connection::ConnectionHandler;
use citrinedb::core::state::ServerState;
use citrinedb::core::storage::Keyspace;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

/// Binds an ephemeral port and runs the accept loop in the background.
async fn spawn_server() -> SocketAddr {
    spawn_server_with_state().await.0
}

async fn spawn_server_with_state() -> (SocketAddr, Arc<ServerState>) {
    let state = Arc::new(ServerState::new(Config::default(), Keyspace::new()));
    let accept_state = state.clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let state = accept_state;
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut session_id: u64 = 0;
        loop {
            let Ok((socket, peer)) = listener.accept().await else {
                break;
            };
            session_id += 1;
            let state = state.clone();
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move {
                let mut handler =
                    ConnectionHandler::new(socket, peer, state, session_id, shutdown_rx);
                let _ = handler.run().await;
            });
        }
    });

    (addr, state)
}

/// Encodes a command as a RESP array of bulk strings.
fn cmd(parts: &[&str]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", parts.len()).into_bytes();
    for part in parts {
        out.extend_from_slice(format!("${}\r\n{part}\r\n", part.len()).as_bytes());
    }
    out
}

/// Reads exactly `expected.len()` bytes (with a deadline) and asserts them.
async fn expect_reply(stream: &mut TcpStream, expected: &[u8]) {
    let mut buf = vec![0u8; expected.len()];
    timeout(Duration::from_secs(2), stream.read_exact(&mut buf))
        .await
        .expect("timed out waiting for reply")
        .expect("read failed");
    assert_eq!(
        buf,
        expected,
        "got {:?}, expected {:?}",
        String::from_utf8_lossy(&buf),
        String::from_utf8_lossy(expected)
    );
}

async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.unwrap()
}

#[tokio::test]
async fn ping_echo_and_pipelining() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(&cmd(&["PING"])).await.unwrap();
    expect_reply(&mut client, b"+PONG\r\n").await;

    client.write_all(&cmd(&["ECHO", "hey"])).await.unwrap();
    expect_reply(&mut client, b"$3\r\nhey\r\n").await;

    // Two frames in one write must both be answered.
    let mut pipelined = cmd(&["PING"]);
    pipelined.extend_from_slice(&cmd(&["PING"]));
    client.write_all(&pipelined).await.unwrap();
    expect_reply(&mut client, b"+PONG\r\n+PONG\r\n").await;
}

#[tokio::test]
async fn set_get_expiry_and_wrongtype() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(&cmd(&["SET", "k", "10"])).await.unwrap();
    expect_reply(&mut client, b"+OK\r\n").await;

    client.write_all(&cmd(&["INCR", "k"])).await.unwrap();
    expect_reply(&mut client, b":11\r\n").await;

    client.write_all(&cmd(&["RPUSH", "k", "z"])).await.unwrap();
    expect_reply(
        &mut client,
        b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
    )
    .await;

    client
        .write_all(&cmd(&["SET", "gone", "v", "PX", "50"]))
        .await
        .unwrap();
    expect_reply(&mut client, b"+OK\r\n").await;
    sleep(Duration::from_millis(100)).await;
    client.write_all(&cmd(&["GET", "gone"])).await.unwrap();
    expect_reply(&mut client, b"$-1\r\n").await;
}

#[tokio::test]
async fn blocking_list_scenario() {
    let addr = spawn_server().await;
    let mut client_a = connect(addr).await;
    let mut client_b = connect(addr).await;

    client_a.write_all(&cmd(&["BLPOP", "k", "0"])).await.unwrap();
    sleep(Duration::from_millis(50)).await;

    client_b.write_all(&cmd(&["RPUSH", "k", "hello"])).await.unwrap();
    // The pusher sees the post-insertion length even though the element was
    // already consumed by the waiter.
    expect_reply(&mut client_b, b":1\r\n").await;
    expect_reply(&mut client_a, b"*2\r\n$1\r\nk\r\n$5\r\nhello\r\n").await;
}

#[tokio::test]
async fn blpop_timeout_returns_null_array() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(&cmd(&["BLPOP", "k", "0.1"])).await.unwrap();
    expect_reply(&mut client, b"*-1\r\n").await;
}

#[tokio::test]
async fn blocking_stream_scenario() {
    let addr = spawn_server().await;
    let mut client_a = connect(addr).await;
    let mut client_b = connect(addr).await;

    client_a
        .write_all(&cmd(&["XREAD", "BLOCK", "0", "STREAMS", "s", "$"]))
        .await
        .unwrap();
    sleep(Duration::from_millis(100)).await;

    client_b
        .write_all(&cmd(&["XADD", "s", "0-1", "temperature", "21"]))
        .await
        .unwrap();
    expect_reply(&mut client_b, b"$3\r\n0-1\r\n").await;

    expect_reply(
        &mut client_a,
        b"*1\r\n*2\r\n$1\r\ns\r\n*1\r\n*2\r\n$3\r\n0-1\r\n*2\r\n$11\r\ntemperature\r\n$2\r\n21\r\n",
    )
    .await;
}

#[tokio::test]
async fn transaction_scenario() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(&cmd(&["MULTI"])).await.unwrap();
    expect_reply(&mut client, b"+OK\r\n").await;
    client.write_all(&cmd(&["INCR", "c"])).await.unwrap();
    expect_reply(&mut client, b"+QUEUED\r\n").await;
    client.write_all(&cmd(&["INCR", "c"])).await.unwrap();
    expect_reply(&mut client, b"+QUEUED\r\n").await;
    client.write_all(&cmd(&["EXEC"])).await.unwrap();
    expect_reply(&mut client, b"*2\r\n:1\r\n:2\r\n").await;

    // A parallel connection reading after EXEC sees the final state only.
    let mut other = connect(addr).await;
    other.write_all(&cmd(&["GET", "c"])).await.unwrap();
    expect_reply(&mut other, b"$1\r\n2\r\n").await;
}

#[tokio::test]
async fn pubsub_scenario() {
    let addr = spawn_server().await;
    let mut subscriber = connect(addr).await;
    let mut publisher = connect(addr).await;

    subscriber.write_all(&cmd(&["SUBSCRIBE", "ch"])).await.unwrap();
    expect_reply(&mut subscriber, b"*3\r\n$9\r\nsubscribe\r\n$2\r\nch\r\n:1\r\n").await;

    publisher.write_all(&cmd(&["PUBLISH", "ch", "hi"])).await.unwrap();
    expect_reply(&mut publisher, b":1\r\n").await;
    expect_reply(&mut subscriber, b"*3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nhi\r\n").await;

    // The command surface is restricted while subscribed.
    subscriber.write_all(&cmd(&["SET", "x", "1"])).await.unwrap();
    expect_reply(
        &mut subscriber,
        b"-ERR Can't execute 'SET' when client is subscribed\r\n",
    )
    .await;

    // PING answers in array form while subscribed.
    subscriber.write_all(&cmd(&["PING"])).await.unwrap();
    expect_reply(&mut subscriber, b"*2\r\n$4\r\npong\r\n$0\r\n\r\n").await;
}

#[tokio::test]
async fn quit_replies_then_closes() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(&cmd(&["QUIT"])).await.unwrap();
    expect_reply(&mut client, b"+OK\r\n").await;

    let mut buf = [0u8; 1];
    let n = timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .expect("timed out waiting for close")
        .expect("read failed");
    assert_eq!(n, 0, "connection should be closed after QUIT");
}

#[tokio::test]
async fn malformed_frame_closes_silently() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(b"!bogus\r\n").await.unwrap();
    let mut buf = [0u8; 64];
    let n = timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .expect("timed out waiting for close")
        .expect("read failed");
    assert_eq!(n, 0, "malformed frames should close the connection");
}

#[tokio::test]
async fn dead_waiter_is_skipped_and_registry_scrubbed() {
    let (addr, state) = spawn_server_with_state().await;
    let key = bytes::Bytes::from_static(b"k");

    let mut client = connect(addr).await;
    client.write_all(&cmd(&["BLPOP", "k", "0.3"])).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(state.blocker_manager.waiter_count(&key), 1);

    // The peer vanishes while blocked. Once the wait resolves, the reply
    // send fails, the connection is torn down and the registries are clean.
    drop(client);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(state.blocker_manager.waiter_count(&key), 0);

    // A push afterwards lands in the list; there is nobody to hand it to.
    let mut other = connect(addr).await;
    other.write_all(&cmd(&["RPUSH", "k", "v"])).await.unwrap();
    expect_reply(&mut other, b":1\r\n").await;
    other.write_all(&cmd(&["LRANGE", "k", "0", "-1"])).await.unwrap();
    expect_reply(&mut other, b"*1\r\n$1\r\nv\r\n").await;
}

#[tokio::test]
async fn unknown_command_is_reported_not_fatal() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;

    client.write_all(&cmd(&["FROB", "x"])).await.unwrap();
    expect_reply(&mut client, b"-ERR unknown command 'FROB'\r\n").await;

    // The connection stays usable.
    client.write_all(&cmd(&["PING"])).await.unwrap();
    expect_reply(&mut client, b"+PONG\r\n").await;
}
