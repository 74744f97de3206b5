pub mod app;

pub use app::{PlayerCommand, PlayerEvent, PlayerHandle};
