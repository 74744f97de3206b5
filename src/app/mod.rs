pub mod history;
pub mod play_queue;
pub mod state;

pub use play_queue::PlayQueue;
pub use state::*;
