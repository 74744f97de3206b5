use super::backend::{MediaBackend, MediaEvent, MediaEventKind, MediaSender};

/// Silent media element used with `--no-audio` or when no output device can
/// be opened. Every assigned source "plays" immediately and never ends.
pub(super) struct NullBackend {
    tx: MediaSender,
    generation: u64,
    position: f64,
}

impl NullBackend {
    pub(super) fn new(tx: MediaSender) -> Self {
        Self {
            tx,
            generation: 0,
            position: 0.0,
        }
    }

    fn send(&self, kind: MediaEventKind) {
        if self.generation == 0 {
            return;
        }
        let _ = self.tx.send(MediaEvent::new(self.generation, kind));
    }
}

impl MediaBackend for NullBackend {
    fn assign(&mut self, generation: u64, url: &str) {
        tracing::debug!(generation, url, "null backend assign");
        self.generation = generation;
        self.position = 0.0;
        self.send(MediaEventKind::Playing);
    }

    fn play(&mut self) {
        self.send(MediaEventKind::Playing);
    }

    fn pause(&mut self) {
        self.send(MediaEventKind::Paused);
    }

    fn seek(&mut self, secs: f64) {
        self.position = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.send(MediaEventKind::Position(self.position));
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn release(&mut self) {
        self.generation = 0;
        self.position = 0.0;
    }
}
