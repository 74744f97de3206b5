use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc;

use super::backend::{MediaBackend, MediaEvent, MediaEventKind, MediaReceiver};
use super::messages::{AudioCommand, AudioEvent};
use crate::domain::{Song, SongId, StreamUrls};
use crate::error::{PlaybackError, ResolveError};
use crate::source::StreamResolver;

/// The currently assigned stream: primary URL plus a cursor into the backups.
struct AudioResource {
    song_id: SongId,
    title: String,
    primary: String,
    backups: Vec<String>,
    /// `None` while the primary is assigned.
    cursor: Option<usize>,
}

impl AudioResource {
    fn new(song_id: SongId, title: String, urls: StreamUrls) -> Self {
        Self {
            song_id,
            title,
            primary: urls.primary,
            backups: urls.backups,
            cursor: None,
        }
    }

    fn current_url(&self) -> &str {
        match self.cursor {
            None => &self.primary,
            Some(i) => &self.backups[i],
        }
    }

    /// Moves to the next unused backup.
    fn advance(&mut self) -> Option<&str> {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next >= self.backups.len() {
            return None;
        }
        self.cursor = Some(next);
        Some(&self.backups[next])
    }

    fn attempts(&self) -> usize {
        self.cursor.map_or(1, |i| i + 2)
    }
}

struct PendingLoad {
    generation: u64,
    song_id: SongId,
    title: String,
}

struct Resolved {
    generation: u64,
    result: Result<StreamUrls, ResolveError>,
}

pub(super) struct AudioEngine<B> {
    tx_evt: mpsc::Sender<AudioEvent>,
    rx_cmd: mpsc::Receiver<AudioCommand>,
    rx_media: MediaReceiver,
    tx_resolved: mpsc::UnboundedSender<Resolved>,
    rx_resolved: mpsc::UnboundedReceiver<Resolved>,
    resolver: Arc<dyn StreamResolver>,
    backend: B,
    generation: u64,
    pending: Option<PendingLoad>,
    resource: Option<AudioResource>,
    paused: bool,
}

impl<B: MediaBackend> AudioEngine<B> {
    pub(super) fn new(
        tx_evt: mpsc::Sender<AudioEvent>,
        rx_cmd: mpsc::Receiver<AudioCommand>,
        rx_media: MediaReceiver,
        resolver: Arc<dyn StreamResolver>,
        backend: B,
    ) -> Self {
        let (tx_resolved, rx_resolved) = mpsc::unbounded_channel();
        Self {
            tx_evt,
            rx_cmd,
            rx_media,
            tx_resolved,
            rx_resolved,
            resolver,
            backend,
            generation: 0,
            pending: None,
            resource: None,
            paused: false,
        }
    }

    pub(super) async fn run(mut self) {
        loop {
            select! {
                biased;
                maybe_cmd = self.rx_cmd.recv() => {
                    match maybe_cmd {
                        Some(AudioCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }
                Some(resolved) = self.rx_resolved.recv() => {
                    self.handle_resolved(resolved).await;
                }
                Some(evt) = self.rx_media.recv() => {
                    self.handle_media_event(evt).await;
                }
            }
        }
        self.teardown();
        tracing::info!("audio controller stopped");
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1).max(1);
        self.generation
    }

    fn teardown(&mut self) {
        self.next_generation();
        self.pending = None;
        self.resource = None;
        self.backend.release();
    }

    async fn emit(&self, evt: AudioEvent) {
        if let Err(e) = self.tx_evt.send(evt).await {
            tracing::debug!(err = %e, "audio event receiver closed");
        }
    }

    async fn handle_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::LoadAndPlay { song } => self.load_and_play(song).await,
            AudioCommand::Play => {
                if self.resource.is_none() {
                    tracing::warn!("play ignored: nothing loaded");
                    return;
                }
                self.backend.play();
            }
            AudioCommand::Pause => {
                if self.resource.is_none() {
                    tracing::warn!("pause ignored: nothing loaded");
                    return;
                }
                self.backend.pause();
            }
            AudioCommand::TogglePlay => {
                if self.resource.is_none() {
                    if self.pending.is_some() {
                        tracing::debug!("toggle ignored: stream still resolving");
                    } else {
                        tracing::warn!("toggle ignored: nothing loaded");
                        self.emit(AudioEvent::NeedsReload).await;
                    }
                    return;
                }
                if self.paused {
                    self.backend.play();
                } else {
                    self.backend.pause();
                }
            }
            AudioCommand::Seek(secs) => {
                if self.resource.is_none() {
                    tracing::warn!(secs, "seek ignored: nothing loaded");
                    return;
                }
                self.backend.seek(secs);
            }
            AudioCommand::SetVolume(v) => {
                if !v.is_finite() {
                    tracing::warn!(volume = v, "ignoring non-finite volume");
                    return;
                }
                let v = v.clamp(0.0, 1.0);
                self.backend.set_volume(v);
                self.emit(AudioEvent::VolumeChanged(v)).await;
            }
            AudioCommand::Stop => {
                self.next_generation();
                self.pending = None;
                self.resource = None;
                self.paused = false;
                self.backend.release();
                self.emit(AudioEvent::PlayStateChanged(false)).await;
            }
            AudioCommand::Shutdown => {}
        }
    }

    async fn load_and_play(&mut self, song: Song) {
        let generation = self.next_generation();
        self.backend.release();
        self.resource = None;
        self.pending = None;
        self.paused = false;

        let title = song.display_title();
        let Some(stream) = song.stream_ref() else {
            tracing::warn!(song_id = %song.id, title = %title, "song has no stream ids");
            self.emit(AudioEvent::Error {
                song_id: song.id,
                error: PlaybackError::MissingStreamIds { title },
            })
            .await;
            return;
        };

        tracing::info!(song_id = %song.id, stream = %stream, generation, "resolving stream");
        self.pending = Some(PendingLoad {
            generation,
            song_id: song.id,
            title,
        });

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx_resolved.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&stream).await;
            let _ = tx.send(Resolved { generation, result });
        });
    }

    async fn handle_resolved(&mut self, resolved: Resolved) {
        let Resolved { generation, result } = resolved;
        if self.pending.as_ref().map(|p| p.generation) != Some(generation) {
            tracing::debug!(
                generation,
                current = self.generation,
                "dropping superseded stream resolution"
            );
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        match result {
            Err(e) => {
                tracing::warn!(song_id = %pending.song_id, err = %e, "stream resolution failed");
                self.emit(AudioEvent::Error {
                    song_id: pending.song_id,
                    error: PlaybackError::Resolution {
                        title: pending.title,
                        message: e.to_string(),
                    },
                })
                .await;
            }
            Ok(urls) => {
                let resource = AudioResource::new(pending.song_id, pending.title, urls);
                tracing::info!(
                    song_id = %resource.song_id,
                    backups = resource.backups.len(),
                    "assigning primary url"
                );
                let generation = self.next_generation();
                self.backend.assign(generation, resource.current_url());
                self.resource = Some(resource);
            }
        }
    }

    async fn handle_media_event(&mut self, evt: MediaEvent) {
        if evt.generation != self.generation {
            tracing::trace!(
                generation = evt.generation,
                current = self.generation,
                kind = ?evt.kind,
                "dropping stale media event"
            );
            return;
        }
        let Some(resource) = self.resource.as_ref() else {
            return;
        };

        match evt.kind {
            MediaEventKind::Playing => {
                self.paused = false;
                self.emit(AudioEvent::PlayStateChanged(true)).await;
            }
            MediaEventKind::Paused => {
                self.paused = true;
                self.emit(AudioEvent::PlayStateChanged(false)).await;
            }
            MediaEventKind::Position(secs) => {
                self.emit(AudioEvent::TimeUpdated(secs)).await;
            }
            MediaEventKind::Duration(secs) => {
                let song_id = resource.song_id.clone();
                self.emit(AudioEvent::DurationChanged { song_id, secs }).await;
            }
            MediaEventKind::Ended => {
                let song_id = resource.song_id.clone();
                // A drained source cannot resume; the next toggle asks for a reload.
                self.next_generation();
                self.backend.release();
                self.resource = None;
                self.paused = false;
                tracing::debug!(song_id = %song_id, "source drained, released");
                self.emit(AudioEvent::Ended { song_id }).await;
            }
            MediaEventKind::Failed(message) => self.handle_failure(message).await,
        }
    }

    /// Walks the backup list; each URL is tried at most once.
    async fn handle_failure(&mut self, message: String) {
        let Some(resource) = self.resource.as_mut() else {
            return;
        };
        tracing::warn!(
            song_id = %resource.song_id,
            url = %resource.current_url(),
            attempt = resource.attempts(),
            err = %message,
            "stream url failed"
        );

        if let Some(next) = resource.advance().map(str::to_owned) {
            tracing::info!(song_id = %resource.song_id, url = %next, "trying backup url");
            let generation = self.next_generation();
            self.backend.assign(generation, &next);
            return;
        }

        let Some(resource) = self.resource.take() else {
            return;
        };
        self.next_generation();
        self.backend.release();
        tracing::error!(
            song_id = %resource.song_id,
            attempts = resource.attempts(),
            "all stream urls failed"
        );
        self.emit(AudioEvent::Error {
            song_id: resource.song_id.clone(),
            error: PlaybackError::Exhausted {
                attempts: resource.attempts(),
                title: resource.title,
                last: message,
            },
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::super::backend::{MediaSender, media_channel};
    use super::super::spawn_audio_engine;
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    struct ScriptedBackend {
        tx: MediaSender,
        failing: HashSet<String>,
        assigned: Arc<Mutex<Vec<String>>>,
        generation: u64,
    }

    impl MediaBackend for ScriptedBackend {
        fn assign(&mut self, generation: u64, url: &str) {
            self.generation = generation;
            self.assigned.lock().unwrap().push(url.to_owned());
            if self.failing.contains(url) {
                let _ = self.tx.send(MediaEvent::new(
                    generation,
                    MediaEventKind::Failed(format!("HTTP 403 for {url}")),
                ));
            } else {
                let _ = self
                    .tx
                    .send(MediaEvent::new(generation, MediaEventKind::Duration(180.0)));
                let _ = self
                    .tx
                    .send(MediaEvent::new(generation, MediaEventKind::Playing));
            }
        }

        fn play(&mut self) {
            let _ = self
                .tx
                .send(MediaEvent::new(self.generation, MediaEventKind::Playing));
        }

        fn pause(&mut self) {
            let _ = self
                .tx
                .send(MediaEvent::new(self.generation, MediaEventKind::Paused));
        }

        fn seek(&mut self, secs: f64) {
            let _ = self
                .tx
                .send(MediaEvent::new(self.generation, MediaEventKind::Position(secs)));
        }

        fn set_volume(&mut self, _volume: f32) {}

        fn release(&mut self) {}
    }

    #[derive(Default)]
    struct FakeResolver {
        streams: HashMap<String, StreamUrls>,
        gate: Option<(String, Arc<Notify>)>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StreamResolver for FakeResolver {
        async fn resolve(&self, stream: &crate::domain::StreamRef) -> Result<StreamUrls, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((video_id, gate)) = &self.gate
                && video_id == &stream.video_id
            {
                gate.notified().await;
            }
            self.streams
                .get(&stream.video_id)
                .cloned()
                .ok_or_else(|| ResolveError::NoStream {
                    video_id: stream.video_id.clone(),
                    part_id: stream.part_id.clone(),
                })
        }
    }

    struct Harness {
        tx: mpsc::Sender<AudioCommand>,
        rx: mpsc::Receiver<AudioEvent>,
        media: MediaSender,
        assigned: Arc<Mutex<Vec<String>>>,
        resolver: Arc<FakeResolver>,
    }

    fn urls(primary: &str, backups: &[&str]) -> StreamUrls {
        StreamUrls {
            primary: primary.to_owned(),
            backups: backups.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn harness(resolver: FakeResolver, failing: &[&str]) -> Harness {
        let (media, rx_media) = media_channel();
        let assigned = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend {
            tx: media.clone(),
            failing: failing.iter().map(|s| (*s).to_owned()).collect(),
            assigned: Arc::clone(&assigned),
            generation: 0,
        };
        let resolver = Arc::new(resolver);
        let (tx, rx) = spawn_audio_engine(backend, rx_media, resolver.clone());
        Harness {
            tx,
            rx,
            media,
            assigned,
            resolver,
        }
    }

    fn song(id: &str) -> Song {
        Song::new(id, id.to_uppercase(), "artist").with_stream(id, "1")
    }

    async fn next_event(rx: &mut mpsc::Receiver<AudioEvent>) -> AudioEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for audio event")
            .expect("audio event channel closed")
    }

    async fn expect_quiet(rx: &mut mpsc::Receiver<AudioEvent>) {
        let res = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(res.is_err(), "unexpected event: {res:?}");
    }

    #[tokio::test]
    async fn backups_are_tried_in_order_until_exhausted() {
        let mut resolver = FakeResolver::default();
        resolver
            .streams
            .insert("a".to_owned(), urls("p", &["b1", "b2"]));
        let mut h = harness(resolver, &["p", "b1", "b2"]);

        h.tx.send(AudioCommand::LoadAndPlay { song: song("a") })
            .await
            .unwrap();

        let evt = next_event(&mut h.rx).await;
        match evt {
            AudioEvent::Error { song_id, error } => {
                assert_eq!(song_id.as_str(), "a");
                assert!(matches!(error, PlaybackError::Exhausted { attempts: 3, .. }));
            }
            other => panic!("expected terminal error, got {other:?}"),
        }
        assert_eq!(*h.assigned.lock().unwrap(), ["p", "b1", "b2"]);
        expect_quiet(&mut h.rx).await;
    }

    #[tokio::test]
    async fn backup_recovers_silently() {
        let mut resolver = FakeResolver::default();
        resolver
            .streams
            .insert("a".to_owned(), urls("p", &["b1", "b2"]));
        let mut h = harness(resolver, &["p"]);

        h.tx.send(AudioCommand::LoadAndPlay { song: song("a") })
            .await
            .unwrap();

        assert_eq!(
            next_event(&mut h.rx).await,
            AudioEvent::DurationChanged {
                song_id: "a".into(),
                secs: 180.0
            }
        );
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::PlayStateChanged(true));
        assert_eq!(*h.assigned.lock().unwrap(), ["p", "b1"]);
    }

    #[tokio::test]
    async fn missing_ids_fail_without_resolution() {
        let mut h = harness(FakeResolver::default(), &[]);
        h.tx.send(AudioCommand::LoadAndPlay {
            song: Song::new("x", "X", "artist"),
        })
        .await
        .unwrap();

        let evt = next_event(&mut h.rx).await;
        assert!(matches!(
            evt,
            AudioEvent::Error {
                error: PlaybackError::MissingStreamIds { .. },
                ..
            }
        ));
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
        assert!(h.assigned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolution_failure_tries_no_urls() {
        let mut h = harness(FakeResolver::default(), &[]);
        h.tx.send(AudioCommand::LoadAndPlay { song: song("gone") })
            .await
            .unwrap();

        let evt = next_event(&mut h.rx).await;
        match evt {
            AudioEvent::Error { error, .. } => assert!(error.is_resolution()),
            other => panic!("expected resolution error, got {other:?}"),
        }
        assert!(h.assigned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn superseded_resolution_is_dropped() {
        let gate = Arc::new(Notify::new());
        let mut resolver = FakeResolver::default();
        resolver.streams.insert("slow".to_owned(), urls("slow-url", &[]));
        resolver.streams.insert("fast".to_owned(), urls("fast-url", &[]));
        resolver.gate = Some(("slow".to_owned(), Arc::clone(&gate)));
        let mut h = harness(resolver, &[]);

        h.tx.send(AudioCommand::LoadAndPlay { song: song("slow") })
            .await
            .unwrap();
        h.tx.send(AudioCommand::LoadAndPlay { song: song("fast") })
            .await
            .unwrap();

        assert!(matches!(
            next_event(&mut h.rx).await,
            AudioEvent::DurationChanged { ref song_id, .. } if song_id.as_str() == "fast"
        ));
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::PlayStateChanged(true));

        gate.notify_one();
        expect_quiet(&mut h.rx).await;
        assert_eq!(*h.assigned.lock().unwrap(), ["fast-url"]);
    }

    #[tokio::test]
    async fn stale_media_events_are_dropped() {
        let mut resolver = FakeResolver::default();
        resolver.streams.insert("a".to_owned(), urls("a-url", &[]));
        resolver.streams.insert("b".to_owned(), urls("b-url", &[]));
        let mut h = harness(resolver, &[]);

        h.tx.send(AudioCommand::LoadAndPlay { song: song("a") })
            .await
            .unwrap();
        next_event(&mut h.rx).await;
        next_event(&mut h.rx).await;

        h.tx.send(AudioCommand::LoadAndPlay { song: song("b") })
            .await
            .unwrap();
        next_event(&mut h.rx).await;
        next_event(&mut h.rx).await;

        // Generation 2 belonged to "a"'s source.
        h.media
            .send(MediaEvent::new(2, MediaEventKind::Ended))
            .unwrap();
        expect_quiet(&mut h.rx).await;
    }

    #[tokio::test]
    async fn controls_without_resource_are_noops() {
        let mut h = harness(FakeResolver::default(), &[]);
        h.tx.send(AudioCommand::Play).await.unwrap();
        h.tx.send(AudioCommand::Pause).await.unwrap();
        h.tx.send(AudioCommand::Seek(42.0)).await.unwrap();
        expect_quiet(&mut h.rx).await;

        h.tx.send(AudioCommand::TogglePlay).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::NeedsReload);
    }

    #[tokio::test]
    async fn toggle_flips_between_play_and_pause() {
        let mut resolver = FakeResolver::default();
        resolver.streams.insert("a".to_owned(), urls("a-url", &[]));
        let mut h = harness(resolver, &[]);

        h.tx.send(AudioCommand::LoadAndPlay { song: song("a") })
            .await
            .unwrap();
        next_event(&mut h.rx).await;
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::PlayStateChanged(true));

        h.tx.send(AudioCommand::TogglePlay).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::PlayStateChanged(false));
        h.tx.send(AudioCommand::TogglePlay).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::PlayStateChanged(true));

        h.tx.send(AudioCommand::Seek(-3.5)).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::TimeUpdated(-3.5));
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let mut h = harness(FakeResolver::default(), &[]);
        h.tx.send(AudioCommand::SetVolume(1.7)).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::VolumeChanged(1.0));
        h.tx.send(AudioCommand::SetVolume(-0.2)).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::VolumeChanged(0.0));
        h.tx.send(AudioCommand::SetVolume(0.35)).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::VolumeChanged(0.35));
    }

    #[tokio::test]
    async fn shutdown_closes_event_stream() {
        let mut resolver = FakeResolver::default();
        resolver.streams.insert("a".to_owned(), urls("a-url", &[]));
        let mut h = harness(resolver, &[]);
        h.tx.send(AudioCommand::LoadAndPlay { song: song("a") })
            .await
            .unwrap();
        next_event(&mut h.rx).await;
        next_event(&mut h.rx).await;

        h.tx.send(AudioCommand::Shutdown).await.unwrap();
        let closed = tokio::time::timeout(Duration::from_secs(2), h.rx.recv())
            .await
            .expect("timed out");
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn natural_end_releases_the_resource() {
        let mut resolver = FakeResolver::default();
        resolver.streams.insert("a".to_owned(), urls("a-url", &[]));
        let mut h = harness(resolver, &[]);

        h.tx.send(AudioCommand::LoadAndPlay { song: song("a") })
            .await
            .unwrap();
        next_event(&mut h.rx).await;
        next_event(&mut h.rx).await;

        h.media
            .send(MediaEvent::new(2, MediaEventKind::Ended))
            .unwrap();
        assert_eq!(
            next_event(&mut h.rx).await,
            AudioEvent::Ended {
                song_id: "a".into()
            }
        );

        // A late position tick from the drained source is stale now.
        h.media
            .send(MediaEvent::new(2, MediaEventKind::Position(180.0)))
            .unwrap();
        expect_quiet(&mut h.rx).await;

        h.tx.send(AudioCommand::TogglePlay).await.unwrap();
        assert_eq!(next_event(&mut h.rx).await, AudioEvent::NeedsReload);
    }
}
