// WebSocket transport: maps connections and text frames onto engine events.

use std::net::SocketAddr;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tombala_core::{ClientMessage, Engine, ServerEvent};
use tracing::{debug, info, warn};

/// Accept connections on `listener` forever, serving each on its own task.
///
/// Every connection gets an opaque id (`conn-<n>`), is subscribed to the
/// engine's broadcasts for its lifetime and is disconnected from the engine
/// when the socket closes.
pub async fn run(listener: TcpListener, engine: Engine) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    let mut next_id: u64 = 0;
    loop {
        let (stream, addr) = listener.accept().await?;
        next_id += 1;
        let conn_id = format!("conn-{next_id}");
        info!("Accepted TCP connection from {addr} as {conn_id}");

        let engine = engine.clone();
        tokio::spawn(async move {
            serve_connection(stream, addr, conn_id, engine).await;
        });
    }
}

async fn serve_connection(stream: TcpStream, addr: SocketAddr, conn_id: String, engine: Engine) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    let (write, read) = ws_stream.split();
    let events = engine.connect(&conn_id).await;
    let writer = tokio::spawn(forward_events(events, write, conn_id.clone()));

    process_message_stream(read, &engine, &conn_id).await;

    engine.disconnect(&conn_id).await;
    writer.abort();
}

/// Drain a connection's event stream into its socket as JSON text frames.
/// Returns when the stream ends (the engine dropped the subscriber) or the
/// socket refuses a write.
pub async fn forward_events<S>(
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    mut sink: S,
    conn_id: String,
) where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(event) = events.recv().await {
        let text = match event.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to encode {} for {conn_id}: {e}", event.name());
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            warn!("Write to {conn_id} failed: {e}");
            break;
        }
    }
    debug!("Writer for {conn_id} finished");
}

/// Decode text frames from `stream` and hand them to the engine on behalf of
/// `conn_id`. Stops at a close frame, a read error or the end of the stream.
///
/// Generic over the stream so it can be driven by in-memory messages in
/// tests.
pub async fn process_message_stream<St>(mut stream: St, engine: &Engine, conn_id: &str)
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match ClientMessage::from_json(&text) {
                Ok(message) => {
                    if let Err(e) = engine.handle(conn_id, message).await {
                        debug!("Event from {conn_id} rejected: {e}");
                    }
                }
                Err(e) => warn!("Ignoring malformed message from {conn_id}: {e}"),
            },
            Ok(Message::Close(_)) => {
                info!("Client {conn_id} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {conn_id}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
}
