pub mod ids;
pub mod model;

pub use ids::{SongId, StreamRef};
pub use model::{LyricLine, Song, StreamUrls};
