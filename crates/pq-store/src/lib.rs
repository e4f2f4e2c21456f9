pub mod client;
pub mod config;
pub mod error;

pub use client::GraphDbClient;
pub use config::{CompileConfig, Config, EndpointConfig};
pub use error::{ClientError, ConfigError, Result};
