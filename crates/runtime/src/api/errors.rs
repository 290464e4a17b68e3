//! Error types surfaced by the overlay runtime API.
//!
//! Host-facing paths never fail; these cover the local API: worker
//! coordination and payload encoding.
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, OverlayError>;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay worker command channel closed")]
    CommandChannelClosed,

    #[error("overlay worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("overlay worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to serialize settings payload")]
    Serialize(#[source] serde_json::Error),
}
