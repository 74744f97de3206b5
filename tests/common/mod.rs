#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use tunecast::audio_worker::{
    MediaBackend, MediaEvent, MediaEventKind, MediaSender, media_channel, spawn_audio_engine,
};
use tunecast::error::ResolveError;
use tunecast::source::StreamResolver;
use tunecast::storage::{MemoryStore, Stores};
use tunecast::{
    PlayerEvent, PlayerHandle, PlayerOptions, PlayerSnapshot, Song, StreamRef, StreamUrls,
    spawn_player,
};

pub const TRACK_SECS: f64 = 180.0;

/// Media element that succeeds or fails per URL, immediately.
pub struct ScriptedBackend {
    tx: MediaSender,
    failing: HashSet<String>,
    assigned: Arc<Mutex<Vec<String>>>,
    generation: Arc<AtomicU64>,
}

impl ScriptedBackend {
    fn send(&self, kind: MediaEventKind) {
        let generation = self.generation.load(Ordering::SeqCst);
        if generation != 0 {
            let _ = self.tx.send(MediaEvent::new(generation, kind));
        }
    }
}

impl MediaBackend for ScriptedBackend {
    fn assign(&mut self, generation: u64, url: &str) {
        self.generation.store(generation, Ordering::SeqCst);
        self.assigned.lock().unwrap().push(url.to_owned());
        if self.failing.contains(url) {
            self.send(MediaEventKind::Failed(format!("HTTP 403 for {url}")));
        } else {
            self.send(MediaEventKind::Duration(TRACK_SECS));
            self.send(MediaEventKind::Playing);
        }
    }

    fn play(&mut self) {
        self.send(MediaEventKind::Playing);
    }

    fn pause(&mut self) {
        self.send(MediaEventKind::Paused);
    }

    fn seek(&mut self, secs: f64) {
        self.send(MediaEventKind::Position(secs));
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn release(&mut self) {
        self.generation.store(0, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeResolver {
    streams: HashMap<String, StreamUrls>,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamResolver for FakeResolver {
    async fn resolve(&self, stream: &StreamRef) -> Result<StreamUrls, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.streams
            .get(&stream.video_id)
            .cloned()
            .ok_or_else(|| ResolveError::NoStream {
                video_id: stream.video_id.clone(),
                part_id: stream.part_id.clone(),
            })
    }
}

pub struct RigBuilder {
    resolver: FakeResolver,
    failing: HashSet<String>,
    stores: Option<Stores>,
    memory: Arc<MemoryStore>,
    options: PlayerOptions,
}

impl RigBuilder {
    pub fn new() -> Self {
        Self {
            resolver: FakeResolver::default(),
            failing: HashSet::new(),
            stores: None,
            memory: Arc::new(MemoryStore::new()),
            options: PlayerOptions {
                rng_seed: Some(11),
                ..PlayerOptions::default()
            },
        }
    }

    /// Registers `{id}-url` as the only URL of song `id`.
    pub fn song(self, id: &str) -> Self {
        self.stream(id, &format!("{id}-url"), &[])
    }

    pub fn stream(mut self, id: &str, primary: &str, backups: &[&str]) -> Self {
        self.resolver.streams.insert(
            video_id(id),
            StreamUrls {
                primary: primary.to_owned(),
                backups: backups.iter().map(|s| (*s).to_owned()).collect(),
            },
        );
        self
    }

    pub fn failing(mut self, urls: &[&str]) -> Self {
        self.failing.extend(urls.iter().map(|s| (*s).to_owned()));
        self
    }

    pub fn memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = memory;
        self
    }

    pub fn stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn options(mut self, options: PlayerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn spawn(self) -> Rig {
        let (tx_media, rx_media) = media_channel();
        let assigned = Arc::new(Mutex::new(Vec::new()));
        let generation = Arc::new(AtomicU64::new(0));
        let backend = ScriptedBackend {
            tx: tx_media.clone(),
            failing: self.failing,
            assigned: Arc::clone(&assigned),
            generation: Arc::clone(&generation),
        };
        let resolver = Arc::new(self.resolver);
        let audio = spawn_audio_engine(backend, rx_media, resolver.clone());
        let stores = self
            .stores
            .unwrap_or_else(|| Stores::shared(Arc::clone(&self.memory)));
        let (handle, events) = spawn_player(self.options, stores, audio);
        Rig {
            handle,
            events,
            media: tx_media,
            generation,
            assigned,
            resolver,
            memory: self.memory,
        }
    }
}

pub struct Rig {
    pub handle: PlayerHandle,
    pub events: mpsc::Receiver<PlayerEvent>,
    pub media: MediaSender,
    pub generation: Arc<AtomicU64>,
    pub assigned: Arc<Mutex<Vec<String>>>,
    pub resolver: Arc<FakeResolver>,
    pub memory: Arc<MemoryStore>,
}

impl Rig {
    /// Waits for the first published state matching `pred`.
    pub async fn wait_state(&mut self, pred: impl Fn(&PlayerSnapshot) -> bool) -> PlayerSnapshot {
        let deadline = tokio::time::sleep(Duration::from_secs(3));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => panic!("timed out waiting for player state"),
                evt = self.events.recv() => match evt {
                    Some(PlayerEvent::State(s)) if pred(&s) => return *s,
                    Some(_) => {}
                    None => panic!("player event stream closed"),
                },
            }
        }
    }

    /// Waits for the next notice, skipping states.
    pub async fn wait_notice(&mut self) -> String {
        let deadline = tokio::time::sleep(Duration::from_secs(3));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => panic!("timed out waiting for notice"),
                evt = self.events.recv() => match evt {
                    Some(PlayerEvent::Notice(n)) => return n,
                    Some(_) => {}
                    None => panic!("player event stream closed"),
                },
            }
        }
    }

    /// Plays `id` and waits until the backend reported its duration.
    pub async fn play_loaded(&mut self, id: &str) -> PlayerSnapshot {
        self.handle.play_song(song(id)).await.unwrap();
        let id = id.to_owned();
        self.wait_state(move |s| {
            s.current_song
                .as_ref()
                .is_some_and(|c| c.id.as_str() == id && c.duration_secs == TRACK_SECS)
                && s.is_playing
        })
        .await
    }

    /// Fires a natural end for whatever source is currently assigned.
    pub fn end_current(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        assert_ne!(generation, 0, "nothing assigned");
        self.media
            .send(MediaEvent::new(generation, MediaEventKind::Ended))
            .unwrap();
    }

    pub fn assigned(&self) -> Vec<String> {
        self.assigned.lock().unwrap().clone()
    }
}

pub fn video_id(id: &str) -> String {
    format!("BV{id}")
}

pub fn song(id: &str) -> Song {
    Song::new(id, id.to_uppercase(), "artist").with_stream(video_id(id), "1")
}

pub fn current_id(s: &PlayerSnapshot) -> Option<&str> {
    s.current_song.as_ref().map(|c| c.id.as_str())
}

pub fn history_ids(s: &PlayerSnapshot) -> Vec<&str> {
    s.history.iter().map(|h| h.id.as_str()).collect()
}
