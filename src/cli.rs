use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tunecast::StreamRef;

#[derive(Debug, Parser)]
#[command(
    name = "tunecast",
    version,
    about = "Console audio player for streams resolved from a video platform"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Override the data directory (defaults to the platform data_local_dir)
    #[arg(long, env = "TUNECAST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the log directory (defaults to `{data_dir}/logs`)
    #[arg(long, env = "TUNECAST_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log filter, same syntax as RUST_LOG
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// Override the play-url API base (defaults to the settings value)
    #[arg(long, env = "TUNECAST_API_BASE")]
    pub api_base: Option<String>,

    /// Do not open an audio device; sources "play" silently
    #[arg(long)]
    pub no_audio: bool,

    /// Keep settings, lyrics, offsets and history in memory only
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Queue the given streams and start an interactive console
    Play {
        /// Streams as `<video_id>:<part_id>`
        #[arg(required = true)]
        streams: Vec<StreamRef>,
    },

    /// Print the primary and backup URLs of one stream
    Resolve { video_id: String, part_id: String },

    /// Print the stored play history, most recent first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}
