use super::CoreState;
use super::player::{advance_to, reload_current};
use crate::audio_worker::AudioEvent;
use crate::core::effects::CoreEffects;
use crate::core::transition::{self, Decision, Trigger};

pub(super) fn handle_audio_event(evt: AudioEvent, state: &mut CoreState, effects: &mut CoreEffects) {
    match evt {
        AudioEvent::PlayStateChanged(playing) => {
            state.player.is_playing = playing;
            if playing {
                state.failed.clear();
            }
        }
        AudioEvent::TimeUpdated(secs) => {
            state.player.current_time = secs;
        }
        AudioEvent::VolumeChanged(v) => {
            if (state.player.volume - v).abs() > f32::EPSILON {
                state.player.volume = v;
                state.persist_settings(effects);
            }
        }
        AudioEvent::DurationChanged { song_id, secs } => {
            if !(secs.is_finite() && secs > 0.0) {
                return;
            }
            state.player.queue.set_duration(&song_id, secs);
            if state.player.is_current(&song_id) {
                state.loaded = Some(song_id);
            }
        }
        AudioEvent::Ended { song_id } => {
            if !state.player.is_current(&song_id) {
                tracing::debug!(song_id = %song_id, "ignoring end of a song no longer current");
                return;
            }
            tracing::info!(song_id = %song_id, "song ended");
            // The controller drops a drained resource.
            state.loaded = None;
            finish_current(state, effects, Trigger::NaturalEnd);
        }
        AudioEvent::Error { song_id, error } => {
            if !state.player.is_current(&song_id) {
                tracing::debug!(song_id = %song_id, err = %error, "ignoring error of a song no longer current");
                return;
            }
            tracing::warn!(song_id = %song_id, err = %error, "playback failed");
            state.loaded = None;
            effects.notice(error.to_string());

            state.failed.insert(song_id);
            let exhausted = state
                .player
                .queue
                .songs()
                .iter()
                .all(|s| state.failed.contains(&s.id));
            if exhausted {
                tracing::error!(failures = state.failed.len(), "every queued song failed, stopping");
                effects.notice("Playback stopped: no song in the queue could be played");
                state.failed.clear();
                state.player.is_playing = false;
                state.player.current_time = 0.0;
                return;
            }
            finish_current(state, effects, Trigger::TerminalError);
        }
        AudioEvent::NeedsReload => {
            if state.player.current_id().is_none() {
                tracing::debug!("nothing to reload");
                return;
            }
            reload_current(state, effects);
        }
        AudioEvent::BackendUnavailable(reason) => {
            effects.notice(format!("Audio output unavailable, playing silently: {reason}"));
        }
    }
}

fn finish_current(state: &mut CoreState, effects: &mut CoreEffects, trigger: Trigger) {
    let failed: Vec<usize> = state
        .player
        .queue
        .songs()
        .iter()
        .enumerate()
        .filter(|(_, s)| state.failed.contains(&s.id))
        .map(|(i, _)| i)
        .collect();
    let decision = transition::decide(
        state.player.mode,
        state.player.current_index(),
        state.player.queue.len(),
        trigger,
        &failed,
        &mut state.rng,
    );
    tracing::debug!(?trigger, ?decision, mode = state.player.mode.label(), "transition");
    match decision {
        Decision::Stop => {
            state.player.is_playing = false;
            state.player.current_time = 0.0;
        }
        Decision::Replay => reload_current(state, effects),
        Decision::Advance(index) => advance_to(state, index),
    }
}
