use super::ids::{SongId, StreamRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub cover: String,
    /// Nominal length; replaced by the decoder's value once known.
    #[serde(default)]
    pub duration_secs: f64,
    /// Platform video id (also the lyrics/offset key when present).
    #[serde(default)]
    pub video_id: Option<String>,
    /// Platform stream-part id.
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub lyrics: Option<Vec<LyricLine>>,
    #[serde(default)]
    pub source: String,
}

impl Song {
    pub fn new(id: impl Into<SongId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            cover: String::new(),
            duration_secs: 0.0,
            video_id: None,
            part_id: None,
            lyrics: None,
            source: String::new(),
        }
    }

    pub fn with_stream(mut self, video_id: impl Into<String>, part_id: impl Into<String>) -> Self {
        self.video_id = Some(video_id.into());
        self.part_id = Some(part_id.into());
        self
    }

    /// Both identifiers are required; `None` means the song cannot be resolved.
    pub fn stream_ref(&self) -> Option<StreamRef> {
        match (&self.video_id, &self.part_id) {
            (Some(video_id), Some(part_id)) => Some(StreamRef {
                video_id: video_id.clone(),
                part_id: part_id.clone(),
            }),
            _ => None,
        }
    }

    /// Key used by the lyrics and offset stores.
    pub fn lyrics_key(&self) -> String {
        self.video_id
            .clone()
            .unwrap_or_else(|| self.id.as_str().to_owned())
    }

    pub fn display_title(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    pub time_ms: u64,
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrls {
    pub primary: String,
    pub backups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lyrics_key_prefers_video_id() {
        let song = Song::new("local-1", "t", "a");
        assert_eq!(song.lyrics_key(), "local-1");

        let song = song.with_stream("BV1", "42");
        assert_eq!(song.lyrics_key(), "BV1");
    }

    #[test]
    fn test_stream_ref_requires_both_ids() {
        let mut song = Song::new("1", "t", "a");
        song.video_id = Some("BV1".to_owned());
        assert!(song.stream_ref().is_none());

        song.part_id = Some("42".to_owned());
        let r = song.stream_ref().unwrap();
        assert_eq!(r.video_id, "BV1");
        assert_eq!(r.part_id, "42");
    }
}
