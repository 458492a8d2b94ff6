use thiserror::Error;

/// Failures while turning relay frames into [`SignalingMessage`](crate::SignalingMessage)s and back.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("malformed signaling frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
