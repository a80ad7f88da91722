//! Websocket connector (tokio-tungstenite).
//!
//! Every envelope travels as one binary message. Text messages are not part of
//! the protocol and are dropped; ping/pong is answered by tungstenite itself.

use super::{Connection, Connector};
use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Connects to a `ws://` or `wss://` endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: Url,
}

impl WebSocketConnector {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn connection_failure(e: impl std::fmt::Display) -> TransportError {
    TransportError::ConnectionFailure(e.to_string())
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        info!(url = %self.url, "Connecting to websocket");

        let (ws_stream, response) = connect_async(self.url.as_str())
            .await
            .map_err(connection_failure)?;
        debug!(status = %response.status(), "Websocket handshake complete");

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(connection_failure)
            .with(|frame: Bytes| future::ready(Ok::<_, TransportError>(Message::Binary(frame))));

        let stream = read.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Binary(frame)) => Some(Ok(frame)),
                Ok(Message::Text(text)) => {
                    warn!(len = text.len(), "Dropping text frame, only binary envelopes are accepted");
                    None
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| format!("closed by server: {} {}", u16::from(f.code), f.reason.as_str()))
                        .unwrap_or_else(|| "closed by server".to_string());
                    Some(Err(TransportError::ConnectionFailure(reason)))
                }
                Ok(_) => None,
                Err(e) => Some(Err(connection_failure(e))),
            })
        });

        Ok(Connection {
            sink: Box::pin(sink),
            stream: stream.boxed(),
        })
    }

    fn endpoint(&self) -> String {
        self.url.to_string()
    }
}
