use super::CoreState;
use crate::audio_worker::AudioCommand;
use crate::core::effects::CoreEffects;
use crate::core::transition::{self, Direction};
use crate::domain::{Song, SongId};
use crate::messages::app::PlayerCommand;

/// Playback and queue commands. Returns false for commands owned elsewhere.
pub(super) fn handle_command(
    cmd: &PlayerCommand,
    state: &mut CoreState,
    effects: &mut CoreEffects,
) -> bool {
    match cmd {
        PlayerCommand::TogglePlay => {
            effects.send_audio_warn(
                AudioCommand::TogglePlay,
                "audio controller closed: TogglePlay dropped",
            );
        }
        PlayerCommand::ToggleMode => {
            state.player.mode = state.player.mode.next();
            tracing::info!(mode = state.player.mode.label(), "play mode changed");
            state.persist_settings(effects);
        }
        PlayerCommand::NextSong => step(state, effects, Direction::Next),
        PlayerCommand::PrevSong => step(state, effects, Direction::Prev),
        PlayerCommand::Seek(secs) => {
            effects.send_audio(AudioCommand::Seek(*secs));
            state.player.current_time = *secs;
        }
        PlayerCommand::ChangeVolume(v) => {
            effects.send_audio(AudioCommand::SetVolume(*v));
        }
        PlayerCommand::PlaySong(song) => play_song(state, effects, (**song).clone()),
        PlayerCommand::Enqueue(songs) => {
            for song in songs {
                state.player.queue.push_if_absent(song.clone());
            }
            tracing::debug!(queue_len = state.player.queue.len(), "songs enqueued");
        }
        PlayerCommand::RemoveFromQueue(id) => remove_from_queue(state, effects, id),
        _ => return false,
    }
    true
}

fn step(state: &mut CoreState, effects: &mut CoreEffects, direction: Direction) {
    let current = state.player.current_index();
    let Some(target) = transition::manual_target(
        state.player.mode,
        current,
        state.player.queue.len(),
        direction,
        &mut state.rng,
    ) else {
        tracing::debug!(?direction, "queue empty, nothing to step to");
        return;
    };

    if current == Some(target) {
        if let Some(song) = state.player.current_song().cloned() {
            state.player.push_history(song);
        }
        restart_current(state, effects);
        return;
    }
    advance_to(state, target);
}

/// Moves to the queue entry at `index`; the synchronizer starts it.
pub(super) fn advance_to(state: &mut CoreState, index: usize) {
    if let Some(prev) = state.player.current_song().cloned() {
        state.player.push_history(prev);
    }
    if !state.player.set_current_index(index) {
        tracing::warn!(index, "advance target out of range");
        return;
    }
    state.player.is_playing = true;
    state.player.current_time = 0.0;
}

/// Seeks a loaded song back to 0, otherwise reloads it.
fn restart_current(state: &mut CoreState, effects: &mut CoreEffects) {
    let Some(id) = state.player.current_id().cloned() else {
        return;
    };
    if state.loaded.as_ref() == Some(&id) {
        tracing::debug!(song_id = %id, "restarting loaded song");
        effects.send_audio(AudioCommand::Seek(0.0));
        effects.send_audio(AudioCommand::Play);
        state.player.is_playing = true;
        state.player.current_time = 0.0;
    } else {
        reload_current(state, effects);
    }
}

/// Re-acquires the resource for the current song. Used when the identity
/// does not change, so the synchronizer would not fire.
pub(super) fn reload_current(state: &mut CoreState, effects: &mut CoreEffects) {
    let Some(song) = state.player.current_song().cloned() else {
        return;
    };
    tracing::info!(song_id = %song.id, "reloading current song");
    state.loaded = None;
    state.player.is_playing = true;
    state.player.current_time = 0.0;
    effects.send_audio_warn(
        AudioCommand::LoadAndPlay { song },
        "audio controller closed: LoadAndPlay dropped",
    );
}

fn play_song(state: &mut CoreState, effects: &mut CoreEffects, song: Song) {
    if state.player.is_current(&song.id) {
        if state.loaded.as_ref() == Some(&song.id) {
            tracing::debug!(song_id = %song.id, "cheap restart");
            effects.send_audio(AudioCommand::Seek(0.0));
            effects.send_audio(AudioCommand::Play);
            state.player.current_time = 0.0;
            return;
        }
        if let Some(current) = state.player.current_song().cloned() {
            state.player.push_history(current);
        }
        reload_current(state, effects);
        return;
    }

    state.player.set_current(song);
    state.player.is_playing = true;
    state.player.current_time = 0.0;
    if let Some(current) = state.player.current_song().cloned() {
        state.player.push_history(current);
    }
}

fn remove_from_queue(state: &mut CoreState, effects: &mut CoreEffects, id: &SongId) {
    let was_current = state.player.is_current(id);
    let Some((index, _)) = state.player.queue.remove(id) else {
        tracing::debug!(song_id = %id, "remove ignored: not queued");
        return;
    };
    tracing::info!(song_id = %id, index, was_current, "removed from queue");
    if !was_current {
        return;
    }

    effects.send_audio(AudioCommand::Stop);
    state.loaded = None;
    state.player.current_time = 0.0;

    let len = state.player.queue.len();
    if len == 0 {
        state.player.clear_current();
        state.player.is_playing = false;
        return;
    }
    let next = if index >= len { 0 } else { index };
    state.player.set_current_index(next);
    state.player.is_playing = true;
}
