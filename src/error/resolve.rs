//! Stream resolution errors

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from play-url endpoint")]
    Status { status: u16 },

    #[error("platform rejected the request (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no playable audio stream for {video_id}:{part_id}")]
    NoStream { video_id: String, part_id: String },
}
