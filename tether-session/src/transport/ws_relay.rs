use crate::transport::relay::{RelayConnection, RelayConnector, RelayFrame};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{debug, info, warn};

/// WebSocket relay connector.
#[derive(Clone, Debug, Default)]
pub struct WsRelayConnector;

#[async_trait]
impl RelayConnector for WsRelayConnector {
    async fn connect(&self, url: &str, subprotocol: Option<&str>) -> Result<RelayConnection> {
        let mut request = url
            .into_client_request()
            .with_context(|| format!("Invalid signaling URL {url}"))?;
        if let Some(protocol) = subprotocol {
            request
                .headers_mut()
                .insert("Sec-WebSocket-Protocol", HeaderValue::from_str(protocol)?);
        }

        info!("Connecting to signaling server: {}", url);
        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        info!("Connected to signaling server: {}", url);

        let (mut sink, mut stream) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<RelayFrame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<RelayFrame>();

        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(RelayFrame::Text(text)).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        let _ = inbound_tx.send(RelayFrame::Close);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = inbound_tx.send(RelayFrame::Error(e.to_string()));
                        break;
                    }
                }
            }
            debug!("WebSocket reader finished");
        });

        tokio::spawn(async move {
            loop {
                let msg = match outbound_rx.recv().await {
                    Some(RelayFrame::Text(text)) => Message::Text(text),
                    Some(RelayFrame::Error(_)) => continue,
                    Some(RelayFrame::Close) => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    None => break,
                };
                if let Err(e) = sink.send(msg).await {
                    // The reader sees the same failure and reports it.
                    warn!("Failed to send WebSocket frame: {}", e);
                    debug!("WebSocket writer finished");
                    return;
                }
            }

            // Closed locally. The relay's close reply is not awaited.
            reader.abort();
            debug!("WebSocket writer finished");
        });

        Ok(RelayConnection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
