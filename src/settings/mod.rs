pub mod store;

pub use store::{
    AppSettings, default_data_dir, load_settings, play_mode_from_string, play_mode_to_string,
    save_settings,
};
