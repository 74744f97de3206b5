use tokio::sync::mpsc;

use crate::app::PlayerSnapshot;
use crate::domain::{LyricLine, Song, SongId};
use crate::error::PlayerClosed;

#[derive(Debug)]
pub enum PlayerCommand {
    TogglePlay,
    ToggleMode,
    NextSong,
    PrevSong,
    Seek(f64),
    ChangeVolume(f32),
    PlaySong(Box<Song>),
    /// Append to the queue without touching playback.
    Enqueue(Vec<Song>),
    RemoveFromQueue(SongId),
    UpdateLyricsFontSize(u16),
    UpdateLyricsOffset(i64),
    UpdateCurrentSongLyrics {
        lines: Vec<LyricLine>,
        source: String,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    State(Box<PlayerSnapshot>),
    /// Human-readable playback failure.
    Notice(String),
}

/// Cloneable front door to the player actor.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    pub(crate) fn new(tx: mpsc::Sender<PlayerCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, cmd: PlayerCommand) -> Result<(), PlayerClosed> {
        self.tx.send(cmd).await.map_err(|_| PlayerClosed)
    }

    pub async fn toggle_play(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::TogglePlay).await
    }

    pub async fn toggle_mode(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::ToggleMode).await
    }

    pub async fn next_song(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::NextSong).await
    }

    pub async fn prev_song(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::PrevSong).await
    }

    pub async fn seek(&self, secs: f64) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Seek(secs)).await
    }

    pub async fn change_volume(&self, volume: f32) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::ChangeVolume(volume)).await
    }

    pub async fn play_song(&self, song: Song) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::PlaySong(Box::new(song))).await
    }

    pub async fn enqueue(&self, songs: Vec<Song>) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Enqueue(songs)).await
    }

    pub async fn remove_from_queue(&self, id: impl Into<SongId>) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::RemoveFromQueue(id.into())).await
    }

    pub async fn update_lyrics_font_size(&self, size: u16) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::UpdateLyricsFontSize(size)).await
    }

    pub async fn update_lyrics_offset(&self, offset_ms: i64) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::UpdateLyricsOffset(offset_ms)).await
    }

    pub async fn update_current_song_lyrics(
        &self,
        lines: Vec<LyricLine>,
        source: impl Into<String>,
    ) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::UpdateCurrentSongLyrics {
            lines,
            source: source.into(),
        })
        .await
    }

    pub async fn shutdown(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Resolves once the actor has stopped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}
