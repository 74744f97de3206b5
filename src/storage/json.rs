use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{HistoryStore, LyricsStore, OffsetStore};
use crate::app::history::{self, HISTORY_LIMIT};
use crate::domain::{LyricLine, Song};
use crate::error::StoreError;

const LYRICS_FILE: &str = "lyrics.json";
const OFFSETS_FILE: &str = "lyrics_offsets.json";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LyricsEntry {
    lines: Vec<LyricLine>,
    source: String,
    updated_at_epoch_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryEntry {
    song: Song,
    played_at_epoch_ms: i64,
}

/// JSON-file backed stores under one data directory.
///
/// Each file is rewritten whole; a per-store mutex serializes the
/// read-modify-write cycles.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    lyrics_lock: Mutex<()>,
    offsets_lock: Mutex<()>,
    history_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lyrics_lock: Mutex::new(()),
            offsets_lock: Mutex::new(()),
            history_lock: Mutex::new(()),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(path).await;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|_| StoreError::io(path, e))?;
    }
    Ok(())
}

#[async_trait]
impl LyricsStore for JsonStore {
    async fn load_lyrics(&self, key: &str) -> Result<Option<Vec<LyricLine>>, StoreError> {
        let _guard = self.lyrics_lock.lock().await;
        let map: HashMap<String, LyricsEntry> = read_json(&self.path(LYRICS_FILE)).await?;
        Ok(map.get(key).map(|e| e.lines.clone()))
    }

    async fn save_lyrics(
        &self,
        key: &str,
        lines: &[LyricLine],
        source: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.lyrics_lock.lock().await;
        let path = self.path(LYRICS_FILE);
        let mut map: HashMap<String, LyricsEntry> = read_json(&path).await?;
        map.insert(
            key.to_owned(),
            LyricsEntry {
                lines: lines.to_vec(),
                source: source.to_owned(),
                updated_at_epoch_ms: Utc::now().timestamp_millis(),
            },
        );
        write_json(&path, &map).await
    }
}

#[async_trait]
impl OffsetStore for JsonStore {
    async fn load_offset(&self, key: &str) -> Result<i64, StoreError> {
        let _guard = self.offsets_lock.lock().await;
        let map: HashMap<String, i64> = read_json(&self.path(OFFSETS_FILE)).await?;
        Ok(map.get(key).copied().unwrap_or(0))
    }

    async fn save_offset(&self, key: &str, offset_ms: i64) -> Result<(), StoreError> {
        let _guard = self.offsets_lock.lock().await;
        let path = self.path(OFFSETS_FILE);
        let mut map: HashMap<String, i64> = read_json(&path).await?;
        if offset_ms == 0 {
            map.remove(key);
        } else {
            map.insert(key.to_owned(), offset_ms);
        }
        write_json(&path, &map).await
    }
}

#[async_trait]
impl HistoryStore for JsonStore {
    async fn record(&self, song: &Song, at: DateTime<Utc>) -> Result<(), StoreError> {
        let _guard = self.history_lock.lock().await;
        let path = self.path(HISTORY_FILE);
        let mut entries: Vec<HistoryEntry> = read_json(&path).await?;
        entries.retain(|e| e.song.id != song.id);
        entries.insert(
            0,
            HistoryEntry {
                song: song.clone(),
                played_at_epoch_ms: at.timestamp_millis(),
            },
        );
        entries.sort_by(|a, b| b.played_at_epoch_ms.cmp(&a.played_at_epoch_ms));
        entries.truncate(HISTORY_LIMIT);
        write_json(&path, &entries).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Song>, StoreError> {
        let _guard = self.history_lock.lock().await;
        let entries: Vec<HistoryEntry> = read_json(&self.path(HISTORY_FILE)).await?;
        let mut songs = Vec::new();
        for entry in entries.into_iter().rev() {
            history::push_front(&mut songs, entry.song);
        }
        songs.truncate(limit.min(HISTORY_LIMIT));
        Ok(songs)
    }
}
