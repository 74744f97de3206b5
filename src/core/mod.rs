mod effects;
mod reducer;
mod sync;

pub mod transition;

pub use reducer::{PlayerOptions, spawn_player};
pub use sync::EffectSynchronizer;
