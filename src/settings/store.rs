use crate::app::{DEFAULT_LYRICS_FONT_SIZE, PlayMode, PlayerState};
use crate::error::SettingsError;
use crate::source::ResolverConfig;
use crate::source::http::{DEFAULT_API_BASE, DEFAULT_REFERER, DEFAULT_USER_AGENT};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // player
    pub volume: f32,
    pub play_mode: String,
    #[serde(default = "default_lyrics_font_size")]
    pub lyrics_font_size: u16,

    // stream resolution
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_http_connect_timeout_secs")]
    pub http_connect_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            play_mode: play_mode_to_string(PlayMode::Loop),
            lyrics_font_size: DEFAULT_LYRICS_FONT_SIZE,
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            http_timeout_secs: default_http_timeout_secs(),
            http_connect_timeout_secs: default_http_connect_timeout_secs(),
        }
    }
}

fn default_lyrics_font_size() -> u16 {
    DEFAULT_LYRICS_FONT_SIZE
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_owned()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_owned()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_http_connect_timeout_secs() -> u64 {
    10
}

impl AppSettings {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            api_base: self.api_base.clone(),
            user_agent: self.user_agent.clone(),
            referer: self.referer.clone(),
            timeout_secs: self.http_timeout_secs,
            connect_timeout_secs: self.http_connect_timeout_secs,
        }
    }

    /// Restores the persisted player preferences onto a fresh state.
    pub fn apply_to(&self, state: &mut PlayerState) {
        state.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        state.mode = play_mode_from_string(&self.play_mode);
        state.lyrics_font_size = self.lyrics_font_size;
    }

    /// Copies the player preferences back for persisting.
    pub fn capture(&mut self, state: &PlayerState) {
        self.volume = state.volume;
        self.play_mode = play_mode_to_string(state.mode);
        self.lyrics_font_size = state.lyrics_font_size;
    }
}

pub fn load_settings(data_dir: &Path) -> AppSettings {
    let p = settings_path(data_dir);
    let Ok(bytes) = fs::read(&p) else {
        return AppSettings::default();
    };
    match serde_json::from_slice(&bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %p.display(), err = %e, "corrupt settings file, using defaults");
            AppSettings::default()
        }
    }
}

pub fn save_settings(data_dir: &Path, s: &AppSettings) -> Result<(), SettingsError> {
    fs::create_dir_all(data_dir).map_err(|source| SettingsError::Save { source })?;
    let p = settings_path(data_dir);
    let tmp = p.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, bytes).map_err(|source| SettingsError::Save { source })?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| SettingsError::Save { source: e })?;
    }
    Ok(())
}

pub fn play_mode_to_string(m: PlayMode) -> String {
    match m {
        PlayMode::Loop => "Loop",
        PlayMode::Single => "Single",
        PlayMode::Shuffle => "Shuffle",
    }
    .to_owned()
}

pub fn play_mode_from_string(s: &str) -> PlayMode {
    match s {
        "Single" => PlayMode::Single,
        "Shuffle" => PlayMode::Shuffle,
        _ => PlayMode::Loop,
    }
}

/// Platform data directory, or a temp dir when none can be determined.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "tunecast", "tunecast")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("tunecast"))
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s: AppSettings =
            serde_json::from_str(r#"{"volume":0.5,"play_mode":"Shuffle"}"#).unwrap();
        assert_eq!(s.lyrics_font_size, DEFAULT_LYRICS_FONT_SIZE);
        assert_eq!(s.api_base, DEFAULT_API_BASE);
        assert_eq!(s.http_timeout_secs, 15);
    }

    #[test]
    fn apply_and_capture_player_preferences() {
        let s = AppSettings {
            volume: 3.0,
            play_mode: "Single".to_owned(),
            lyrics_font_size: 22,
            ..AppSettings::default()
        };
        let mut state = PlayerState::default();
        s.apply_to(&mut state);
        assert_eq!(state.volume, 1.0);
        assert_eq!(state.mode, PlayMode::Single);
        assert_eq!(state.lyrics_font_size, 22);

        state.mode = PlayMode::Shuffle;
        state.volume = 0.25;
        let mut back = AppSettings::default();
        back.capture(&state);
        assert_eq!(back.play_mode, "Shuffle");
        assert_eq!(back.volume, 0.25);
    }

    #[test]
    fn unknown_mode_falls_back_to_loop() {
        assert_eq!(play_mode_from_string("ListLoop"), PlayMode::Loop);
        for m in [PlayMode::Loop, PlayMode::Single, PlayMode::Shuffle] {
            assert_eq!(play_mode_from_string(&play_mode_to_string(m)), m);
        }
    }
}
