pub mod config;
pub mod errors;
pub mod external;

pub use config::AppConfig;
pub use errors::{FetchError, InfrastructureError};
pub use external::LiveAtcClient;
