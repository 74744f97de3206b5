use crate::domain::{Song, SongId};

/// Ordered play queue. Ids are unique within the queue.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    songs: Vec<Song>,
}

impl PlayQueue {
    pub fn new(songs: Vec<Song>) -> Self {
        let mut q = Self::default();
        for song in songs {
            q.push_if_absent(song);
        }
        q
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn position(&self, id: &SongId) -> Option<usize> {
        self.songs.iter().position(|s| &s.id == id)
    }

    pub fn get(&self, id: &SongId) -> Option<&Song> {
        self.songs.iter().find(|s| &s.id == id)
    }

    pub fn get_mut(&mut self, id: &SongId) -> Option<&mut Song> {
        self.songs.iter_mut().find(|s| &s.id == id)
    }

    /// Appends `song` unless its id is already queued. Returns the song's index.
    pub fn push_if_absent(&mut self, song: Song) -> usize {
        if let Some(idx) = self.position(&song.id) {
            return idx;
        }
        self.songs.push(song);
        self.songs.len() - 1
    }

    /// Removes the song with `id`, returning its former index.
    pub fn remove(&mut self, id: &SongId) -> Option<(usize, Song)> {
        let idx = self.position(id)?;
        Some((idx, self.songs.remove(idx)))
    }

    /// Records the decoder-reported duration. Returns false for unknown ids.
    pub fn set_duration(&mut self, id: &SongId, secs: f64) -> bool {
        match self.get_mut(id) {
            Some(song) => {
                song.duration_secs = secs;
                true
            }
            None => false,
        }
    }
}
