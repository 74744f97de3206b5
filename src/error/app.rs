//! Binary-level errors

use super::{ResolveError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("stream resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Closed(#[from] PlayerClosed),
}

/// The player actor is gone; commands can no longer be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("player actor has stopped")]
pub struct PlayerClosed;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to save settings: {source}")]
    Save {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serde(#[from] serde_json::Error),
}
