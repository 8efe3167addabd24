//! Live WebSocket tick source.

use crate::error::{FeedError, FeedResult};
use crate::parser::TickParser;
use futures_util::{SinkExt, StreamExt};
use stoikov_core::{Tick, TickSource};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

/// Upper bound on a single inbound frame; anything larger is a protocol
/// violation and resets the connection.
const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Live book-ticker stream over WebSocket.
///
/// Yields parsed `Tick`s; malformed frames and unknown symbols are counted
/// and skipped, transport errors and stream end terminate the source (the
/// pipeline treats `None` as a normal close).
pub struct BookTickerFeed {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    parser: TickParser,
    /// Frames dropped for protocol or validity violations.
    rejected_frames: u64,
    closed: bool,
}

impl BookTickerFeed {
    /// Open the stream. Fails only when the transport cannot be established;
    /// that failure is fatal to startup by design.
    pub async fn connect(url: &str) -> FeedResult<Self> {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(MAX_FRAME_BYTES);
        ws_config.max_frame_size = Some(MAX_FRAME_BYTES);

        let (ws, response) = connect_async_with_config(url, Some(ws_config), false)
            .await
            .map_err(|e| FeedError::Connect(format!("{url}: {e}")))?;

        info!(url, status = %response.status(), "book-ticker stream connected");

        Ok(Self {
            ws,
            parser: TickParser::new(),
            rejected_frames: 0,
            closed: false,
        })
    }

    pub fn rejected_frames(&self) -> u64 {
        self.rejected_frames
    }

    pub fn parser(&self) -> &TickParser {
        &self.parser
    }
}

impl TickSource for BookTickerFeed {
    async fn next(&mut self) -> Option<Tick> {
        if self.closed {
            return None;
        }

        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => match self.parser.parse(&text) {
                    Ok(Some(tick)) => return Some(tick),
                    Ok(None) => continue, // unknown symbol, ignored
                    Err(e) => {
                        self.rejected_frames += 1;
                        warn!(%e, "dropping bad frame");
                        continue;
                    }
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = self.ws.send(Message::Pong(payload)).await {
                        warn!(?e, "pong failed, closing feed");
                        self.closed = true;
                        return None;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "server closed the stream");
                    self.closed = true;
                    return None;
                }
                Some(Ok(_)) => continue, // binary/pong frames are ignored
                Some(Err(e)) => {
                    // Includes oversized frames per the connection config.
                    warn!(?e, "transport error, closing feed");
                    self.closed = true;
                    return None;
                }
                None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.ws.close(None).await {
                warn!(?e, "error closing websocket");
            }
        }
    }
}
