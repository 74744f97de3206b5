//! Playback-path errors reported by the audio controller

/// Terminal playback failure for one song.
///
/// Recoverable failures of a single URL never reach this type; they are
/// absorbed by the backup cascade inside the controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The song lacks the ids needed to ask for a stream.
    #[error("cannot resolve \"{title}\": missing video or part id")]
    MissingStreamIds { title: String },

    /// Stream lookup failed before any URL existed.
    #[error("stream lookup failed for \"{title}\": {message}")]
    Resolution { title: String, message: String },

    /// Every candidate URL failed.
    #[error("playback failed for \"{title}\" after {attempts} attempt(s): {last}")]
    Exhausted {
        title: String,
        attempts: usize,
        last: String,
    },
}

impl PlaybackError {
    /// True when no URL was ever assigned for the song.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            PlaybackError::MissingStreamIds { .. } | PlaybackError::Resolution { .. }
        )
    }
}
