use tokio::sync::mpsc;

/// Raw event from the media element, tagged with the generation of the
/// source it was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: u64,
    pub kind: MediaEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    Playing,
    Paused,
    Position(f64),
    Duration(f64),
    Ended,
    /// The assigned URL could not be fetched or decoded.
    Failed(String),
}

impl MediaEvent {
    pub fn new(generation: u64, kind: MediaEventKind) -> Self {
        Self { generation, kind }
    }
}

pub type MediaSender = mpsc::UnboundedSender<MediaEvent>;
pub type MediaReceiver = mpsc::UnboundedReceiver<MediaEvent>;

pub fn media_channel() -> (MediaSender, MediaReceiver) {
    mpsc::unbounded_channel()
}

/// The single playable element owned by the audio controller.
///
/// `assign` replaces the current source and starts it asynchronously; the
/// outcome arrives as [`MediaEvent`]s carrying the same generation. Events of
/// a superseded source may still arrive and are filtered by the controller.
pub trait MediaBackend {
    fn assign(&mut self, generation: u64, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, secs: f64);
    fn set_volume(&mut self, volume: f32);
    fn release(&mut self);
}
