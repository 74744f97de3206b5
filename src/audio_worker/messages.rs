use crate::domain::{Song, SongId};
use crate::error::PlaybackError;

#[derive(Debug)]
pub enum AudioCommand {
    /// Resolve the song's stream and start playing it, superseding whatever was loaded.
    LoadAndPlay {
        song: Song,
    },
    Play,
    Pause,
    TogglePlay,
    /// Position in seconds. Not clamped.
    Seek(f64),
    SetVolume(f32),
    Stop,
    /// Tear down; no events are emitted afterwards.
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    PlayStateChanged(bool),
    TimeUpdated(f64),
    Ended {
        song_id: SongId,
    },
    VolumeChanged(f32),
    DurationChanged {
        song_id: SongId,
        secs: f64,
    },
    /// Terminal failure: resolution failed or every URL was tried.
    Error {
        song_id: SongId,
        error: PlaybackError,
    },
    /// `TogglePlay` arrived with nothing loaded.
    NeedsReload,
    /// The output device could not be opened; playback is silent.
    BackendUnavailable(String),
}
