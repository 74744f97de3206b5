use crate::app::{PlayerSnapshot, PlayerState};
use crate::audio_worker::AudioCommand;
use crate::domain::{LyricLine, Song, SongId};
use crate::messages::app::PlayerEvent;
use crate::settings::{self, AppSettings};
use crate::storage::Stores;
use chrono::Utc;
use std::path::Path;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct CoreEffects {
    pub(super) actions: Vec<CoreEffect>,
}

#[derive(Debug)]
pub enum CoreEffect {
    EmitState(Box<PlayerSnapshot>),
    Notice(String),
    SendAudio {
        cmd: AudioCommand,
        warn: Option<&'static str>,
    },
    LoadLyrics {
        song_id: SongId,
        key: String,
    },
    LoadOffset {
        song_id: SongId,
        key: String,
    },
    LoadHistory,
    RecordHistory(Box<Song>),
    SaveLyrics {
        key: String,
        lines: Vec<LyricLine>,
        source: String,
    },
    SaveOffset {
        key: String,
        offset_ms: i64,
    },
    SaveSettings(Box<AppSettings>),
}

/// Completions of spawned loads, posted back to the player actor.
#[derive(Debug)]
pub enum LoadResult {
    Lyrics {
        song_id: SongId,
        lines: Vec<LyricLine>,
    },
    Offset {
        song_id: SongId,
        offset_ms: i64,
    },
    History(Vec<Song>),
}

impl CoreEffects {
    pub fn emit_state(&mut self, state: &PlayerState) {
        self.actions
            .push(CoreEffect::EmitState(Box::new(PlayerSnapshot::from_state(state))));
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.actions.push(CoreEffect::Notice(message.into()));
    }

    pub fn send_audio(&mut self, cmd: AudioCommand) {
        self.actions.push(CoreEffect::SendAudio { cmd, warn: None });
    }

    pub fn send_audio_warn(&mut self, cmd: AudioCommand, warn: &'static str) {
        self.actions.push(CoreEffect::SendAudio {
            cmd,
            warn: Some(warn),
        });
    }

    pub fn load_lyrics(&mut self, song_id: SongId, key: String) {
        self.actions.push(CoreEffect::LoadLyrics { song_id, key });
    }

    pub fn load_offset(&mut self, song_id: SongId, key: String) {
        self.actions.push(CoreEffect::LoadOffset { song_id, key });
    }

    pub fn load_history(&mut self) {
        self.actions.push(CoreEffect::LoadHistory);
    }

    pub fn record_history(&mut self, song: Song) {
        self.actions.push(CoreEffect::RecordHistory(Box::new(song)));
    }

    pub fn save_lyrics(&mut self, key: String, lines: Vec<LyricLine>, source: String) {
        self.actions
            .push(CoreEffect::SaveLyrics { key, lines, source });
    }

    pub fn save_offset(&mut self, key: String, offset_ms: i64) {
        self.actions.push(CoreEffect::SaveOffset { key, offset_ms });
    }

    pub fn save_settings(&mut self, settings: &AppSettings) {
        self.actions
            .push(CoreEffect::SaveSettings(Box::new(settings.clone())));
    }
}

pub struct CoreDispatch<'a> {
    pub(super) tx_audio: &'a mpsc::Sender<AudioCommand>,
    pub(super) tx_evt: &'a mpsc::Sender<PlayerEvent>,
    pub(super) tx_loaded: &'a mpsc::UnboundedSender<LoadResult>,
    pub(super) stores: &'a Stores,
    pub(super) settings_dir: Option<&'a Path>,
}

/// Runs effects in order. Audio commands and settings writes happen in place;
/// store I/O is spawned so it never delays playback.
pub async fn run_effects(effects: CoreEffects, dispatch: &CoreDispatch<'_>) {
    for effect in effects.actions {
        match effect {
            CoreEffect::EmitState(snapshot) => {
                let _ = dispatch.tx_evt.send(PlayerEvent::State(snapshot)).await;
            }
            CoreEffect::Notice(msg) => {
                let _ = dispatch.tx_evt.send(PlayerEvent::Notice(msg)).await;
            }
            CoreEffect::SendAudio { cmd, warn } => {
                if let Err(e) = dispatch.tx_audio.send(cmd).await
                    && let Some(ctx) = warn
                {
                    tracing::warn!(err = %e, "{ctx}");
                }
            }
            CoreEffect::LoadLyrics { song_id, key } => {
                let store = dispatch.stores.lyrics.clone();
                let tx = dispatch.tx_loaded.clone();
                tokio::spawn(async move {
                    match store.load_lyrics(&key).await {
                        Ok(Some(lines)) => {
                            let _ = tx.send(LoadResult::Lyrics { song_id, lines });
                        }
                        Ok(None) => tracing::debug!(%key, "no cached lyrics"),
                        Err(e) => tracing::warn!(%key, err = %e, "failed to load lyrics"),
                    }
                });
            }
            CoreEffect::LoadOffset { song_id, key } => {
                let store = dispatch.stores.offsets.clone();
                let tx = dispatch.tx_loaded.clone();
                tokio::spawn(async move {
                    match store.load_offset(&key).await {
                        Ok(offset_ms) => {
                            let _ = tx.send(LoadResult::Offset { song_id, offset_ms });
                        }
                        Err(e) => tracing::warn!(%key, err = %e, "failed to load lyrics offset"),
                    }
                });
            }
            CoreEffect::LoadHistory => {
                let store = dispatch.stores.history.clone();
                let tx = dispatch.tx_loaded.clone();
                tokio::spawn(async move {
                    match store.recent(crate::app::history::HISTORY_LIMIT).await {
                        Ok(songs) => {
                            let _ = tx.send(LoadResult::History(songs));
                        }
                        Err(e) => tracing::warn!(err = %e, "failed to load play history"),
                    }
                });
            }
            CoreEffect::RecordHistory(song) => {
                let store = dispatch.stores.history.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.record(&song, Utc::now()).await {
                        tracing::warn!(song_id = %song.id, err = %e, "failed to record history");
                    }
                });
            }
            CoreEffect::SaveLyrics { key, lines, source } => {
                let store = dispatch.stores.lyrics.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.save_lyrics(&key, &lines, &source).await {
                        tracing::warn!(%key, err = %e, "failed to save lyrics");
                    }
                });
            }
            CoreEffect::SaveOffset { key, offset_ms } => {
                let store = dispatch.stores.offsets.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.save_offset(&key, offset_ms).await {
                        tracing::warn!(%key, err = %e, "failed to save lyrics offset");
                    }
                });
            }
            CoreEffect::SaveSettings(s) => {
                let Some(dir) = dispatch.settings_dir else {
                    continue;
                };
                // Written in place so successive saves land in order.
                if let Err(e) = settings::save_settings(dir, &s) {
                    tracing::warn!(err = %e, "failed to save settings");
                }
            }
        }
    }
}
