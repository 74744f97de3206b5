use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

use super::backend::{MediaBackend, MediaEvent, MediaEventKind, MediaSender};
use super::download::download_to_tempfile;

const POSITION_TICK: Duration = Duration::from_millis(500);

struct ActiveSink {
    sink: Arc<Sink>,
    end_cancel: Arc<AtomicBool>,
    _file: NamedTempFile,
}

impl ActiveSink {
    fn stop(self) {
        self.end_cancel.store(true, Ordering::Relaxed);
        self.sink.stop();
    }
}

struct Shared {
    /// Generation of the assigned source; 0 when released.
    generation: u64,
    current: Option<ActiveSink>,
    volume: f32,
    /// Last play/pause request; outlives the download of a new source.
    paused: bool,
}

impl Shared {
    /// Records a play/pause request and applies it to the sink if one is
    /// installed. Returns the generation to report under, `None` when released.
    fn set_paused(&mut self, paused: bool) -> Option<u64> {
        if self.generation == 0 {
            return None;
        }
        self.paused = paused;
        if let Some(cur) = self.current.as_ref() {
            if paused {
                cur.sink.pause();
            } else {
                cur.sink.play();
            }
        }
        Some(self.generation)
    }
}

/// Media element backed by a rodio sink. Sources are downloaded whole into a
/// temp file before decoding.
pub(super) struct RodioBackend {
    mixer: Mixer,
    _stream: OutputStream,
    http: reqwest::Client,
    tx: MediaSender,
    shared: Arc<Mutex<Shared>>,
}

impl RodioBackend {
    pub(super) fn new(stream: OutputStream, http: reqwest::Client, tx: MediaSender) -> Self {
        let mixer = stream.mixer().clone();
        Self {
            mixer,
            _stream: stream,
            http,
            tx,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                current: None,
                volume: 1.0,
                paused: false,
            })),
        }
    }

    fn request_paused(&self, paused: bool) {
        let Ok(mut shared) = self.shared.lock() else {
            tracing::error!("audio state lock poisoned");
            return;
        };
        if let Some(generation) = shared.set_paused(paused) {
            let kind = if paused {
                MediaEventKind::Paused
            } else {
                MediaEventKind::Playing
            };
            let _ = self.tx.send(MediaEvent::new(generation, kind));
        }
    }

    fn with_current(&self, f: impl FnOnce(&Sink, u64)) {
        let Ok(shared) = self.shared.lock() else {
            tracing::error!("audio state lock poisoned");
            return;
        };
        if let Some(cur) = shared.current.as_ref() {
            f(&cur.sink, shared.generation);
        }
    }
}

impl MediaBackend for RodioBackend {
    fn assign(&mut self, generation: u64, url: &str) {
        {
            let Ok(mut shared) = self.shared.lock() else {
                tracing::error!("audio state lock poisoned");
                return;
            };
            shared.generation = generation;
            shared.paused = false;
            if let Some(cur) = shared.current.take() {
                cur.stop();
            }
        }

        let http = self.http.clone();
        let mixer = self.mixer.clone();
        let tx = self.tx.clone();
        let shared = Arc::clone(&self.shared);
        let url = url.to_owned();
        tokio::task::spawn_local(async move {
            let fail = |message: String| {
                let _ = tx.send(MediaEvent::new(generation, MediaEventKind::Failed(message)));
            };

            let file = match download_to_tempfile(&http, &url).await {
                Ok(f) => f,
                Err(e) => return fail(e),
            };
            let (sink, total) = match build_sink(&mixer, &file) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };

            let sink = Arc::new(sink);
            let start_paused;
            {
                let Ok(mut guard) = shared.lock() else {
                    return;
                };
                if guard.generation != generation {
                    tracing::debug!(generation, "dropping superseded source");
                    sink.stop();
                    return;
                }
                let end_cancel = match spawn_end_watch(generation, Arc::clone(&sink), tx.clone())
                {
                    Ok(c) => c,
                    Err(e) => {
                        sink.stop();
                        return fail(e);
                    }
                };
                sink.set_volume(guard.volume);
                start_paused = guard.paused;
                if start_paused {
                    tracing::debug!(generation, "pause requested during download, staying paused");
                } else {
                    sink.play();
                }
                guard.current = Some(ActiveSink {
                    sink: Arc::clone(&sink),
                    end_cancel,
                    _file: file,
                });
            }

            if let Some(total) = total {
                let _ = tx.send(MediaEvent::new(
                    generation,
                    MediaEventKind::Duration(total.as_secs_f64()),
                ));
            }
            if !start_paused {
                let _ = tx.send(MediaEvent::new(generation, MediaEventKind::Playing));
            }
            tick_position(generation, sink, shared, tx).await;
        });
    }

    fn play(&mut self) {
        self.request_paused(false);
    }

    fn pause(&mut self) {
        self.request_paused(true);
    }

    fn seek(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        let tx = self.tx.clone();
        self.with_current(|sink, generation| {
            if let Err(e) = sink.try_seek(Duration::from_secs_f64(secs)) {
                tracing::warn!(secs, err = %e, "seek failed");
                return;
            }
            let _ = tx.send(MediaEvent::new(generation, MediaEventKind::Position(secs)));
        });
    }

    fn set_volume(&mut self, volume: f32) {
        let Ok(mut shared) = self.shared.lock() else {
            return;
        };
        shared.volume = volume;
        if let Some(cur) = shared.current.as_ref() {
            cur.sink.set_volume(volume);
        }
    }

    fn release(&mut self) {
        let Ok(mut shared) = self.shared.lock() else {
            return;
        };
        shared.generation = 0;
        if let Some(cur) = shared.current.take() {
            tracing::debug!("releasing current sink");
            cur.stop();
        }
    }
}

fn build_sink(mixer: &Mixer, file: &NamedTempFile) -> Result<(Sink, Option<Duration>), String> {
    let f = File::open(file.path()).map_err(|e| format!("open audio file: {e}"))?;
    let decoder = Decoder::new(BufReader::new(f)).map_err(|e| format!("decode: {e}"))?;
    let total = decoder.total_duration();
    let sink = Sink::connect_new(mixer);
    sink.pause();
    sink.append(decoder);
    Ok((sink, total))
}

fn spawn_end_watch(
    generation: u64,
    sink: Arc<Sink>,
    tx: MediaSender,
) -> Result<Arc<AtomicBool>, String> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_end = Arc::clone(&cancel);
    thread::Builder::new()
        .name(format!("audio-end-watch-{generation}"))
        .spawn(move || {
            sink.sleep_until_end();
            if cancel_end.load(Ordering::Relaxed) {
                tracing::debug!(generation, "end watch cancelled");
                return;
            }
            let _ = tx.send(MediaEvent::new(generation, MediaEventKind::Ended));
        })
        .map_err(|e| format!("spawn end watch: {e}"))?;
    Ok(cancel)
}

async fn tick_position(
    generation: u64,
    sink: Arc<Sink>,
    shared: Arc<Mutex<Shared>>,
    tx: MediaSender,
) {
    let mut interval = tokio::time::interval(POSITION_TICK);
    loop {
        interval.tick().await;
        let live = shared
            .lock()
            .map(|s| s.generation == generation)
            .unwrap_or(false);
        if !live || sink.empty() {
            break;
        }
        if sink.is_paused() {
            continue;
        }
        let pos = sink.get_pos().as_secs_f64();
        if tx
            .send(MediaEvent::new(generation, MediaEventKind::Position(pos)))
            .is_err()
        {
            break;
        }
    }
}
