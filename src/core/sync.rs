use crate::app::PlayerState;
use crate::audio_worker::AudioCommand;
use crate::core::effects::CoreEffects;
use crate::domain::SongId;

/// Fires the once-per-song effects when the current song's identity changes.
///
/// The cursor is private to the player actor and only compared by id, so
/// attaching lyrics or correcting the duration of the current song never
/// restarts playback.
#[derive(Debug, Default)]
pub struct EffectSynchronizer {
    last_song_id: Option<SongId>,
}

impl EffectSynchronizer {
    /// Returns true when the identity changed.
    ///
    /// `LoadAndPlay` is queued before the lyrics, offset and history effects.
    pub fn observe(&mut self, state: &PlayerState, effects: &mut CoreEffects) -> bool {
        let current = state.current_id();
        if current == self.last_song_id.as_ref() {
            return false;
        }
        self.last_song_id = current.cloned();

        let Some(song) = state.current_song() else {
            tracing::debug!("current song cleared");
            return true;
        };
        tracing::info!(song_id = %song.id, title = %song.title, "current song changed");

        effects.send_audio_warn(
            AudioCommand::LoadAndPlay { song: song.clone() },
            "audio controller closed: LoadAndPlay dropped",
        );
        let key = song.lyrics_key();
        effects.load_lyrics(song.id.clone(), key.clone());
        effects.load_offset(song.id.clone(), key);
        effects.record_history(song.clone());
        true
    }

    pub fn reset(&mut self) {
        self.last_song_id = None;
    }

    pub fn last_song_id(&self) -> Option<&SongId> {
        self.last_song_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::effects::CoreEffect;
    use crate::domain::{LyricLine, Song};

    fn kinds(effects: &CoreEffects) -> Vec<&'static str> {
        effects
            .actions
            .iter()
            .map(|a| match a {
                CoreEffect::SendAudio {
                    cmd: AudioCommand::LoadAndPlay { .. },
                    ..
                } => "load",
                CoreEffect::LoadLyrics { .. } => "lyrics",
                CoreEffect::LoadOffset { .. } => "offset",
                CoreEffect::RecordHistory(_) => "history",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn identity_change_fires_in_order() {
        let mut sync = EffectSynchronizer::default();
        let mut state = PlayerState::default();
        state.set_current(Song::new("a", "A", "x").with_stream("BV1", "11"));

        let mut effects = CoreEffects::default();
        assert!(sync.observe(&state, &mut effects));
        assert_eq!(kinds(&effects), ["load", "lyrics", "offset", "history"]);
        assert_eq!(sync.last_song_id().map(SongId::as_str), Some("a"));

        match &effects.actions[1] {
            CoreEffect::LoadLyrics { song_id, key } => {
                assert_eq!(song_id.as_str(), "a");
                assert_eq!(key, "BV1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn same_id_with_new_lyrics_fires_nothing() {
        let mut sync = EffectSynchronizer::default();
        let mut state = PlayerState::default();
        state.set_current(Song::new("a", "A", "x"));
        sync.observe(&state, &mut CoreEffects::default());

        state.set_current_lyrics(vec![LyricLine {
            time_ms: 0,
            text: "hi".to_owned(),
            translation: None,
        }]);
        let mut effects = CoreEffects::default();
        assert!(!sync.observe(&state, &mut effects));
        assert!(effects.actions.is_empty());
    }

    #[test]
    fn clearing_and_reset() {
        let mut sync = EffectSynchronizer::default();
        let mut state = PlayerState::default();
        state.set_current(Song::new("a", "A", "x"));
        sync.observe(&state, &mut CoreEffects::default());

        state.clear_current();
        let mut effects = CoreEffects::default();
        assert!(sync.observe(&state, &mut effects));
        assert!(effects.actions.is_empty());
        assert!(sync.last_song_id().is_none());

        state.set_current_index(0);
        sync.observe(&state, &mut CoreEffects::default());
        sync.reset();
        let mut effects = CoreEffects::default();
        assert!(sync.observe(&state, &mut effects));
        assert_eq!(kinds(&effects)[0], "load");
    }
}
