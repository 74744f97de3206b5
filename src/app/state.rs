use super::history;
use super::play_queue::PlayQueue;
use crate::domain::{LyricLine, Song, SongId};

pub const DEFAULT_LYRICS_FONT_SIZE: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    Loop,
    Single,
    Shuffle,
}

impl PlayMode {
    /// Fixed cycle: Loop -> Single -> Shuffle -> Loop.
    pub fn next(self) -> Self {
        match self {
            PlayMode::Loop => PlayMode::Single,
            PlayMode::Single => PlayMode::Shuffle,
            PlayMode::Shuffle => PlayMode::Loop,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Loop => "loop",
            PlayMode::Single => "single",
            PlayMode::Shuffle => "shuffle",
        }
    }
}

/// Canonical player state. Mutated only by the player actor.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub is_playing: bool,
    current: Option<SongId>,
    pub current_time: f64,
    pub volume: f32,
    pub queue: PlayQueue,
    history: Vec<Song>,
    pub mode: PlayMode,
    pub lyrics_font_size: u16,
    pub lyrics_offset_ms: i64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current: None,
            current_time: 0.0,
            volume: 1.0,
            queue: PlayQueue::default(),
            history: Vec::new(),
            mode: PlayMode::Loop,
            lyrics_font_size: DEFAULT_LYRICS_FONT_SIZE,
            lyrics_offset_ms: 0,
        }
    }
}

impl PlayerState {
    pub fn current_id(&self) -> Option<&SongId> {
        self.current.as_ref()
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current.as_ref().and_then(|id| self.queue.get(id))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().and_then(|id| self.queue.position(id))
    }

    pub fn is_current(&self, id: &SongId) -> bool {
        self.current.as_ref() == Some(id)
    }

    /// Makes `song` current, appending it to the queue when absent.
    pub fn set_current(&mut self, song: Song) {
        let id = song.id.clone();
        self.queue.push_if_absent(song);
        self.current = Some(id);
    }

    /// Makes the queue entry at `index` current. Returns false when out of range.
    pub fn set_current_index(&mut self, index: usize) -> bool {
        let Some(song) = self.queue.songs().get(index) else {
            return false;
        };
        self.current = Some(song.id.clone());
        true
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn history(&self) -> &[Song] {
        &self.history
    }

    pub fn push_history(&mut self, song: Song) {
        history::push_front(&mut self.history, song);
    }

    pub fn replace_history(&mut self, songs: Vec<Song>) {
        self.history.clear();
        for song in songs.into_iter().rev() {
            history::push_front(&mut self.history, song);
        }
    }

    /// Attaches lyrics to the current queue entry without changing its identity.
    pub fn set_current_lyrics(&mut self, lines: Vec<LyricLine>) -> bool {
        let Some(id) = self.current.clone() else {
            return false;
        };
        match self.queue.get_mut(&id) {
            Some(song) => {
                song.lyrics = Some(lines);
                true
            }
            None => false,
        }
    }
}

/// Owned view of [`PlayerState`] published after every reduction.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub is_playing: bool,
    pub current_song: Option<Song>,
    pub current_time: f64,
    pub volume: f32,
    pub queue: Vec<Song>,
    pub history: Vec<Song>,
    pub mode: PlayMode,
    pub lyrics_font_size: u16,
    pub lyrics_offset_ms: i64,
}

impl PlayerSnapshot {
    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            is_playing: state.is_playing,
            current_song: state.current_song().cloned(),
            current_time: state.current_time,
            volume: state.volume,
            queue: state.queue.songs().to_vec(),
            history: state.history.clone(),
            mode: state.mode,
            lyrics_font_size: state.lyrics_font_size,
            lyrics_offset_ms: state.lyrics_offset_ms,
        }
    }
}
