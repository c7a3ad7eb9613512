pub mod app_config;

pub use app_config::{
    expandir_tilde, AppConfig, DownloadSettings, Endpoints, HttpSettings, TokenSettings, MAX_JOBS,
};
