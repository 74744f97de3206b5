use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::time::Duration;

use super::StreamResolver;
use super::dto::{PlayUrlData, PlayUrlResp};
use crate::domain::{StreamRef, StreamUrls};
use crate::error::ResolveError;

pub const DEFAULT_API_BASE: &str = "https://api.bilibili.com";
pub const DEFAULT_REFERER: &str = "https://www.bilibili.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub api_base: String,
    pub user_agent: String,
    pub referer: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            referer: DEFAULT_REFERER.to_owned(),
            timeout_secs: 15,
            connect_timeout_secs: 10,
        }
    }
}

impl ResolverConfig {
    /// HTTP client carrying the headers the platform's CDN insists on.
    /// Shared by stream resolution and audio download.
    pub fn http_client(&self) -> Result<reqwest::Client, ResolveError> {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&self.referer) {
            headers.insert(REFERER, v);
        }
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()?;
        Ok(client)
    }
}

/// Resolves streams through the platform's play-url endpoint.
#[derive(Debug, Clone)]
pub struct HttpStreamResolver {
    http: reqwest::Client,
    api_base: String,
}

impl HttpStreamResolver {
    pub fn new(cfg: &ResolverConfig) -> Result<Self, ResolveError> {
        Ok(Self {
            http: cfg.http_client()?,
            api_base: cfg.api_base.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl StreamResolver for HttpStreamResolver {
    async fn resolve(&self, stream: &StreamRef) -> Result<StreamUrls, ResolveError> {
        let url = format!("{}/x/player/playurl", self.api_base);
        tracing::debug!(video_id = %stream.video_id, part_id = %stream.part_id, "resolving stream");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("bvid", stream.video_id.as_str()),
                ("cid", stream.part_id.as_str()),
                ("fnval", "16"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes().await?;
        let body: PlayUrlResp = serde_json::from_slice(&bytes)?;
        if body.code != 0 {
            return Err(ResolveError::Api {
                code: body.code,
                message: body.message,
            });
        }

        let urls = body.data.and_then(pick_stream).ok_or_else(|| ResolveError::NoStream {
            video_id: stream.video_id.clone(),
            part_id: stream.part_id.clone(),
        })?;
        tracing::debug!(
            video_id = %stream.video_id,
            backups = urls.backups.len(),
            "stream resolved"
        );
        Ok(urls)
    }
}

/// Highest-bandwidth DASH audio first, progressive `durl` otherwise.
fn pick_stream(data: PlayUrlData) -> Option<StreamUrls> {
    let best_audio = data
        .dash
        .and_then(|d| d.audio)
        .unwrap_or_default()
        .into_iter()
        .filter(|a| a.primary().is_some())
        .max_by_key(|a| a.bandwidth);
    if let Some(audio) = best_audio {
        let primary = audio.primary()?.to_owned();
        let backups = dedup_backups(&primary, audio.backups());
        return Some(StreamUrls { primary, backups });
    }

    let durl = data.durl.into_iter().find(|d| !d.url.is_empty())?;
    let backups = dedup_backups(&durl.url, durl.backup_url.unwrap_or_default());
    Some(StreamUrls {
        primary: durl.url,
        backups,
    })
}

fn dedup_backups(primary: &str, backups: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(backups.len());
    for url in backups {
        if url.is_empty() || url == primary || out.contains(&url) {
            continue;
        }
        out.push(url);
    }
    out
}
