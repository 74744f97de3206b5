//! Lyrics, lyrics-offset and history stores.
//!
//! Failures here are logged by the caller and never interrupt playback.

mod json;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::{LyricLine, Song};
use crate::error::StoreError;

pub use json::JsonStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait LyricsStore: Send + Sync {
    /// `Ok(None)` when nothing is cached for `key`.
    async fn load_lyrics(&self, key: &str) -> Result<Option<Vec<LyricLine>>, StoreError>;

    async fn save_lyrics(
        &self,
        key: &str,
        lines: &[LyricLine],
        source: &str,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OffsetStore: Send + Sync {
    /// Signed milliseconds, 0 when unset.
    async fn load_offset(&self, key: &str) -> Result<i64, StoreError>;

    async fn save_offset(&self, key: &str, offset_ms: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append-or-update by song id.
    async fn record(&self, song: &Song, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Most recent first.
    async fn recent(&self, limit: usize) -> Result<Vec<Song>, StoreError>;
}

/// The three stores the player actor talks to.
#[derive(Clone)]
pub struct Stores {
    pub lyrics: Arc<dyn LyricsStore>,
    pub offsets: Arc<dyn OffsetStore>,
    pub history: Arc<dyn HistoryStore>,
}

impl Stores {
    /// One backing store serving all three roles.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: LyricsStore + OffsetStore + HistoryStore + 'static,
    {
        Self {
            lyrics: store.clone(),
            offsets: store.clone(),
            history: store,
        }
    }
}
