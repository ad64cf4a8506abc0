pub mod chunker;
pub mod config;
pub mod credentials;
pub mod data_processor;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
