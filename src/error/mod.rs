//! Structured error types for every concern of the player.

mod app;
mod playback;
mod resolve;
mod store;

pub use app::{AppError, PlayerClosed, SettingsError};
pub use playback::PlaybackError;
pub use resolve::ResolveError;
pub use store::StoreError;
