use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("webrtc failure: {0}")]
    Rtc(#[from] webrtc::Error),

    #[error("malformed candidate: {0}")]
    MalformedCandidate(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Failed(String),

    #[error("transport closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("websocket failure: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("signaling connection closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
