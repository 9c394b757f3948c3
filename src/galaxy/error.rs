/// Protocol violations reported back to the client that caused them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GalaxyError {
    #[error("system {0} cannot be connected to itself")]
    SelfConnection(String),

    #[error("system {0} already has its maximum of {1} connections")]
    MaxConnections(String, usize),

    #[error("systems {0} and {1} are already connected")]
    AlreadyConnected(String, String),

    #[error("unknown system {0}")]
    UnknownSystem(String),

    #[error("unknown player {0}")]
    UnknownPlayer(String),

    #[error("session {0} has not joined a galaxy")]
    NotJoined(String),
}

/// Persistence failures. These are logged by the store, never surfaced to players.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
