use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{HistoryStore, LyricsStore, OffsetStore};
use crate::app::history::{self, HISTORY_LIMIT};
use crate::domain::{LyricLine, Song};
use crate::error::StoreError;

/// Process-local stores, nothing touches disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lyrics: Mutex<HashMap<String, (Vec<LyricLine>, String)>>,
    offsets: Mutex<HashMap<String, i64>>,
    history: Mutex<Vec<Song>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source tag recorded with the cached lyrics for `key`.
    pub fn lyrics_source(&self, key: &str) -> Option<String> {
        self.lyrics
            .lock()
            .ok()
            .and_then(|m| m.get(key).map(|(_, source)| source.clone()))
    }
}

#[async_trait]
impl LyricsStore for MemoryStore {
    async fn load_lyrics(&self, key: &str) -> Result<Option<Vec<LyricLine>>, StoreError> {
        let map = self.lyrics.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).map(|(lines, _)| lines.clone()))
    }

    async fn save_lyrics(
        &self,
        key: &str,
        lines: &[LyricLine],
        source: &str,
    ) -> Result<(), StoreError> {
        let mut map = self.lyrics.lock().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.to_owned(), (lines.to_vec(), source.to_owned()));
        Ok(())
    }
}

#[async_trait]
impl OffsetStore for MemoryStore {
    async fn load_offset(&self, key: &str) -> Result<i64, StoreError> {
        let map = self.offsets.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).copied().unwrap_or(0))
    }

    async fn save_offset(&self, key: &str, offset_ms: i64) -> Result<(), StoreError> {
        let mut map = self.offsets.lock().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.to_owned(), offset_ms);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn record(&self, song: &Song, _at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut h = self.history.lock().map_err(|_| StoreError::Poisoned)?;
        history::push_front(&mut h, song.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Song>, StoreError> {
        let h = self.history.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(h.iter().take(limit.min(HISTORY_LIMIT)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_source_tag() {
        let store = MemoryStore::new();
        let lines = vec![LyricLine {
            time_ms: 0,
            text: "la".to_owned(),
            translation: None,
        }];
        store.save_lyrics("k", &lines, "qq").await.unwrap();
        assert_eq!(store.lyrics_source("k").as_deref(), Some("qq"));
        assert_eq!(store.load_lyrics("k").await.unwrap(), Some(lines));
    }

    #[tokio::test]
    async fn history_dedups() {
        let store = MemoryStore::new();
        let a = Song::new("a", "A", "x");
        let b = Song::new("b", "B", "x");
        store.record(&a, Utc::now()).await.unwrap();
        store.record(&b, Utc::now()).await.unwrap();
        store.record(&a, Utc::now()).await.unwrap();
        let ids: Vec<_> = store
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id.as_str().to_owned())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn poisoned_lock_is_reported() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let s = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = s.offsets.lock().unwrap();
            panic!("poison the offsets lock");
        })
        .join();

        let err = store.load_offset("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Poisoned));
        assert_eq!(store.load_lyrics("k").await.unwrap(), None);
    }
}
