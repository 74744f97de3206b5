mod cli;
mod console;

use clap::Parser;
use cli::{Cli, Command};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tunecast::audio_worker::{AudioBackend, spawn_audio_worker};
use tunecast::error::AppError;
use tunecast::logging;
use tunecast::settings::{self, AppSettings};
use tunecast::source::{HttpStreamResolver, StreamResolver};
use tunecast::storage::{HistoryStore, JsonStore, MemoryStore, Stores};
use tunecast::{PlayerOptions, Song, StreamRef, spawn_player};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(settings::default_data_dir);

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(data_dir = %data_dir.display(), ephemeral = cli.ephemeral, "tunecast starting");

    let mut app_settings = if cli.ephemeral {
        AppSettings::default()
    } else {
        settings::load_settings(&data_dir)
    };
    if let Some(v) = cli.api_base.clone() {
        app_settings.api_base = v;
    }

    let no_audio_env = env::var("TUNECAST_NO_AUDIO")
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
    let audio_backend = if cli.no_audio || no_audio_env {
        AudioBackend::Null
    } else {
        AudioBackend::Real
    };

    match cli.command {
        Command::Play { streams } => {
            play(&data_dir, app_settings, audio_backend, cli.ephemeral, streams).await
        }
        Command::Resolve { video_id, part_id } => {
            let resolver = HttpStreamResolver::new(&app_settings.resolver_config())?;
            let urls = resolver.resolve(&StreamRef { video_id, part_id }).await?;
            println!("primary: {}", urls.primary);
            for (i, url) in urls.backups.iter().enumerate() {
                println!("backup {}: {url}", i + 1);
            }
            Ok(())
        }
        Command::History { limit } => {
            let store = JsonStore::new(&data_dir);
            let songs = store.recent(limit).await?;
            if songs.is_empty() {
                println!("no history yet");
            }
            for song in songs {
                println!("{} [{}]", song.display_title(), song.id);
            }
            Ok(())
        }
    }
}

async fn play(
    data_dir: &Path,
    app_settings: AppSettings,
    audio_backend: AudioBackend,
    ephemeral: bool,
    streams: Vec<StreamRef>,
) -> Result<(), AppError> {
    let resolver_cfg = app_settings.resolver_config();
    let http = resolver_cfg.http_client()?;
    let resolver: Arc<dyn StreamResolver> = Arc::new(HttpStreamResolver::new(&resolver_cfg)?);
    let audio = spawn_audio_worker(audio_backend, resolver, http);

    let stores = if ephemeral {
        Stores::shared(Arc::new(MemoryStore::new()))
    } else {
        Stores::shared(Arc::new(JsonStore::new(data_dir)))
    };
    let options = PlayerOptions {
        settings: app_settings,
        settings_dir: (!ephemeral).then(|| data_dir.to_path_buf()),
        rng_seed: None,
    };
    let (handle, events) = spawn_player(options, stores, audio);

    let songs: Vec<Song> = streams
        .iter()
        .map(|s| Song::new(s.to_string(), s.to_string(), "unknown").with_stream(&s.video_id, &s.part_id))
        .collect();
    tracing::info!(count = songs.len(), "queueing songs");
    let first = songs.first().cloned();
    handle.enqueue(songs).await?;
    if let Some(song) = first {
        handle.play_song(song).await?;
    }

    console::run(handle, events).await
}
