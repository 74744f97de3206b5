use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identity of a track, independent of which optional fields are populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SongId {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

impl From<String> for SongId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl Borrow<str> for SongId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifiers needed to ask the platform for a playable stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamRef {
    pub video_id: String,
    pub part_id: String,
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.video_id, self.part_id)
    }
}

impl std::str::FromStr for StreamRef {
    type Err = String;

    /// Parses `video_id:part_id`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (video_id, part_id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <video_id>:<part_id>, got {s:?}"))?;
        if video_id.trim().is_empty() || part_id.trim().is_empty() {
            return Err(format!("empty id in {s:?}"));
        }
        Ok(Self {
            video_id: video_id.trim().to_owned(),
            part_id: part_id.trim().to_owned(),
        })
    }
}
