use crate::app::PlayerState;
use crate::audio_worker::{AudioCommand, AudioEvent};
use crate::core::effects::{CoreDispatch, CoreEffects, LoadResult, run_effects};
use crate::core::sync::EffectSynchronizer;
use crate::domain::SongId;
use crate::messages::app::{PlayerCommand, PlayerEvent, PlayerHandle};
use crate::settings::AppSettings;
use crate::storage::Stores;

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::mpsc;

mod audio;
mod lyrics;
mod player;

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

enum CoreMsg {
    Cmd(PlayerCommand),
    Audio(AudioEvent),
    Loaded(LoadResult),
}

/// Startup configuration of the player actor.
#[derive(Debug, Clone, Default)]
pub struct PlayerOptions {
    /// Restored preferences; also the base for every settings write.
    pub settings: AppSettings,
    /// Where `settings.json` is written. `None` keeps preferences in memory.
    pub settings_dir: Option<PathBuf>,
    /// Fixed seed for shuffle picks.
    pub rng_seed: Option<u64>,
}

struct CoreState {
    player: PlayerState,
    sync: EffectSynchronizer,
    rng: StdRng,
    settings: AppSettings,
    /// Song the controller reported a positive duration for.
    loaded: Option<SongId>,
    /// Current song whose offset the user set before the stored one arrived.
    offset_edited: Option<SongId>,
    /// Songs that failed since the last successful start.
    failed: HashSet<SongId>,
}

impl CoreState {
    fn new(settings: AppSettings, rng: StdRng) -> Self {
        let mut player = PlayerState::default();
        settings.apply_to(&mut player);
        Self {
            player,
            sync: EffectSynchronizer::default(),
            rng,
            settings,
            loaded: None,
            offset_edited: None,
            failed: HashSet::new(),
        }
    }

    #[cfg(test)]
    fn for_test() -> Self {
        Self::new(AppSettings::default(), StdRng::seed_from_u64(42))
    }

    fn persist_settings(&mut self, effects: &mut CoreEffects) {
        self.settings.capture(&self.player);
        effects.save_settings(&self.settings);
    }
}

/// Applies one message. Returns true when the actor should stop.
fn reduce(msg: CoreMsg, state: &mut CoreState, effects: &mut CoreEffects) -> bool {
    match msg {
        CoreMsg::Cmd(PlayerCommand::Shutdown) => {
            tracing::info!("player shutting down");
            effects.send_audio(AudioCommand::Shutdown);
            state.sync.reset();
            return true;
        }
        CoreMsg::Cmd(cmd) => {
            if !player::handle_command(&cmd, state, effects) {
                lyrics::handle_command(cmd, state, effects);
            }
        }
        CoreMsg::Audio(evt) => audio::handle_audio_event(evt, state, effects),
        CoreMsg::Loaded(result) => lyrics::handle_loaded(result, state),
    }

    if state.sync.observe(&state.player, effects) {
        state.loaded = None;
        state.offset_edited = None;
        state.player.lyrics_offset_ms = 0;
    }
    effects.emit_state(&state.player);
    false
}

/// Spawns the player actor on top of an audio controller's channel pair.
pub fn spawn_player(
    options: PlayerOptions,
    stores: Stores,
    audio: (mpsc::Sender<AudioCommand>, mpsc::Receiver<AudioEvent>),
) -> (PlayerHandle, mpsc::Receiver<PlayerEvent>) {
    let (tx_cmd, mut rx_cmd) = mpsc::channel::<PlayerCommand>(COMMAND_CAPACITY);
    let (tx_evt, rx_evt) = mpsc::channel::<PlayerEvent>(EVENT_CAPACITY);
    let (tx_audio, mut rx_audio_evt) = audio;

    tokio::spawn(async move {
        let PlayerOptions {
            settings,
            settings_dir,
            rng_seed,
        } = options;
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut state = CoreState::new(settings, rng);
        let (tx_loaded, mut rx_loaded) = mpsc::unbounded_channel::<LoadResult>();

        let dispatch = CoreDispatch {
            tx_audio: &tx_audio,
            tx_evt: &tx_evt,
            tx_loaded: &tx_loaded,
            stores: &stores,
            settings_dir: settings_dir.as_deref(),
        };

        tracing::info!(
            volume = state.player.volume,
            mode = state.player.mode.label(),
            "player started"
        );
        let mut effects = CoreEffects::default();
        effects.send_audio(AudioCommand::SetVolume(state.player.volume));
        effects.load_history();
        effects.emit_state(&state.player);
        run_effects(effects, &dispatch).await;

        loop {
            let msg = tokio::select! {
                maybe_cmd = rx_cmd.recv() => match maybe_cmd {
                    Some(cmd) => CoreMsg::Cmd(cmd),
                    None => CoreMsg::Cmd(PlayerCommand::Shutdown),
                },
                Some(evt) = rx_audio_evt.recv() => CoreMsg::Audio(evt),
                Some(result) = rx_loaded.recv() => CoreMsg::Loaded(result),
            };

            let mut effects = CoreEffects::default();
            let should_quit = reduce(msg, &mut state, &mut effects);
            run_effects(effects, &dispatch).await;
            if should_quit {
                break;
            }
        }
        tracing::info!("player stopped");
    });

    (PlayerHandle::new(tx_cmd), rx_evt)
}
