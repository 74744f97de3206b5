//! Playback orchestration for a desktop audio player: player state and
//! actions, the transition policy, a stream controller with backup-URL
//! fallback, and once-per-song side effects gated on song identity.

pub mod app;
pub mod audio_worker;
pub mod core;
pub mod domain;
pub mod error;
pub mod logging;
pub mod messages;
pub mod settings;
pub mod source;
pub mod storage;

pub use app::{PlayMode, PlayerSnapshot, PlayerState};
pub use core::{PlayerOptions, spawn_player};
pub use domain::{LyricLine, Song, SongId, StreamRef, StreamUrls};
pub use messages::{PlayerCommand, PlayerEvent, PlayerHandle};
