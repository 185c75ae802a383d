mod app;
mod config;
mod reporter;

pub use app::run_app;
pub use config::{load_config, CONFIG_FILENAME};
