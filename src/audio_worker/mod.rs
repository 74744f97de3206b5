//! Audio resource controller.
//!
//! Owns the single media element, resolves stream URLs on demand and walks
//! the backup list when a URL fails. Every source assignment gets a fresh
//! generation; media events and resolution results from older generations
//! are dropped.

mod backend;
mod download;
mod engine;
mod messages;
mod null_engine;
mod player;

use rodio::OutputStreamBuilder;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::source::StreamResolver;
use engine::AudioEngine;
use null_engine::NullBackend;
use player::RodioBackend;

pub use backend::{MediaBackend, MediaEvent, MediaEventKind, MediaReceiver, MediaSender, media_channel};
pub use messages::{AudioCommand, AudioEvent};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    /// Default output device through rodio.
    Real,
    /// No sound; sources "play" instantly.
    Null,
}

pub fn spawn_audio_worker(
    backend: AudioBackend,
    resolver: Arc<dyn StreamResolver>,
    http: reqwest::Client,
) -> (mpsc::Sender<AudioCommand>, mpsc::Receiver<AudioEvent>) {
    match backend {
        AudioBackend::Null => {
            let (tx_media, rx_media) = media_channel();
            spawn_audio_engine(NullBackend::new(tx_media), rx_media, resolver)
        }
        AudioBackend::Real => spawn_rodio(resolver, http),
    }
}

/// Runs the controller on the current runtime with a caller-supplied media
/// element. `rx_media` must be the receiving half of the element's sender.
pub fn spawn_audio_engine<B>(
    backend: B,
    rx_media: MediaReceiver,
    resolver: Arc<dyn StreamResolver>,
) -> (mpsc::Sender<AudioCommand>, mpsc::Receiver<AudioEvent>)
where
    B: MediaBackend + Send + Sync + 'static,
{
    let (tx_cmd, rx_cmd) = mpsc::channel(CHANNEL_CAPACITY);
    let (tx_evt, rx_evt) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        AudioEngine::new(tx_evt, rx_cmd, rx_media, resolver, backend)
            .run()
            .await;
    });
    (tx_cmd, rx_evt)
}

// rodio's output stream is tied to the thread that opened it, so the real
// controller gets its own thread and a LocalSet.
fn spawn_rodio(
    resolver: Arc<dyn StreamResolver>,
    http: reqwest::Client,
) -> (mpsc::Sender<AudioCommand>, mpsc::Receiver<AudioEvent>) {
    let (tx_cmd, rx_cmd) = mpsc::channel(CHANNEL_CAPACITY);
    let (tx_evt, rx_evt) = mpsc::channel(CHANNEL_CAPACITY);

    let spawned = std::thread::Builder::new()
        .name("audio-controller".to_owned())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(err = %e, "failed to build audio runtime");
                    return;
                }
            };
            let local = tokio::task::LocalSet::new();
            local.block_on(&rt, async move {
                let (tx_media, rx_media) = media_channel();
                match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => {
                        tracing::info!("audio output opened");
                        let backend = RodioBackend::new(stream, http, tx_media);
                        AudioEngine::new(tx_evt, rx_cmd, rx_media, resolver, backend)
                            .run()
                            .await;
                    }
                    Err(e) => {
                        tracing::error!(err = %e, "failed to open audio output, playing silently");
                        let _ = tx_evt
                            .send(AudioEvent::BackendUnavailable(e.to_string()))
                            .await;
                        let backend = NullBackend::new(tx_media);
                        AudioEngine::new(tx_evt, rx_cmd, rx_media, resolver, backend)
                            .run()
                            .await;
                    }
                }
            });
        });
    if let Err(e) = spawned {
        tracing::error!(err = %e, "failed to spawn audio thread");
    }

    (tx_cmd, rx_evt)
}
