use super::CoreState;
use crate::core::effects::{CoreEffects, LoadResult};
use crate::messages::app::PlayerCommand;

pub(super) fn handle_command(cmd: PlayerCommand, state: &mut CoreState, effects: &mut CoreEffects) {
    match cmd {
        PlayerCommand::UpdateLyricsFontSize(size) => {
            state.player.lyrics_font_size = size;
            state.persist_settings(effects);
        }
        PlayerCommand::UpdateLyricsOffset(offset_ms) => {
            state.player.lyrics_offset_ms = offset_ms;
            if let Some(song) = state.player.current_song() {
                effects.save_offset(song.lyrics_key(), offset_ms);
                state.offset_edited = Some(song.id.clone());
            }
        }
        PlayerCommand::UpdateCurrentSongLyrics { lines, source } => {
            let Some(key) = state.player.current_song().map(|s| s.lyrics_key()) else {
                tracing::debug!("lyrics update ignored: no current song");
                return;
            };
            tracing::info!(%key, lines = lines.len(), %source, "lyrics attached");
            state.player.set_current_lyrics(lines.clone());
            effects.save_lyrics(key, lines, source);
        }
        other => tracing::warn!(cmd = ?other, "unhandled player command"),
    }
}

/// Merges a finished load if its song is still current.
pub(super) fn handle_loaded(result: LoadResult, state: &mut CoreState) {
    match result {
        LoadResult::Lyrics { song_id, lines } => {
            if !state.player.is_current(&song_id) {
                tracing::debug!(song_id = %song_id, "dropping stale lyrics");
                return;
            }
            state.player.set_current_lyrics(lines);
        }
        LoadResult::Offset { song_id, offset_ms } => {
            if !state.player.is_current(&song_id) {
                tracing::debug!(song_id = %song_id, "dropping stale lyrics offset");
                return;
            }
            if state.offset_edited.as_ref() == Some(&song_id) {
                tracing::debug!(song_id = %song_id, "keeping offset set during load");
                return;
            }
            state.player.lyrics_offset_ms = offset_ms;
        }
        LoadResult::History(songs) => {
            tracing::debug!(count = songs.len(), "play history restored");
            // Entries from this session stay in front.
            let mut merged = state.player.history().to_vec();
            merged.extend(songs);
            state.player.replace_history(merged);
        }
    }
}
