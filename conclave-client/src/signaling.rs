use conclave_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

use crate::error::SignalingError;

const CHANNEL_BUFFER: usize = 64;

/// JSON-over-WebSocket signaling channel to the relay server.
///
/// Reading and writing run in their own tasks; the rest of the client only
/// sees typed [`SignalMessage`] channels. Dropping every sender closes the
/// socket.
pub struct SignalingClient {
    tx: mpsc::Sender<SignalMessage>,
}

impl SignalingClient {
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<SignalMessage>), SignalingError> {
        let (ws, _) = connect_async(url).await?;
        let (mut write, mut read) = ws.split();

        let (out_tx, mut out_rx) = mpsc::channel::<SignalMessage>(CHANNEL_BUFFER);
        let (in_tx, in_rx) = mpsc::channel::<SignalMessage>(CHANNEL_BUFFER);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("failed to serialize signal message: {e}");
                        continue;
                    }
                };
                if write.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            let _ = write.send(Message::Close(None)).await;
            debug!("signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("websocket failure: {e}");
                        break;
                    }
                };
                match frame {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(msg) => {
                            if in_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("invalid signal message: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("signaling reader finished");
        });

        Ok((Self { tx: out_tx }, in_rx))
    }

    /// A clonable send half, for handing to the session.
    pub fn sender(&self) -> mpsc::Sender<SignalMessage> {
        self.tx.clone()
    }

    pub async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        self.tx.send(msg).await.map_err(|_| SignalingError::Closed)
    }
}
