//! Most-recent-first play history, deduplicated by id.

use crate::domain::Song;

pub const HISTORY_LIMIT: usize = 50;

/// Moves `song` to the front, dropping any older entry with the same id and
/// trimming to [`HISTORY_LIMIT`].
pub fn push_front(history: &mut Vec<Song>, song: Song) {
    history.retain(|s| s.id != song.id);
    history.insert(0, song);
    history.truncate(HISTORY_LIMIT);
}
