pub mod bridge;
pub mod config;

use anyhow::Result;
use std::path::Path;

pub use bridge::DecoderBridge;
pub use config::{DecodeConfig, RequestStaging};

/// A line recognizer driven through a materialized configuration file.
pub trait Decoder {
    fn decode(&self, config_path: &Path) -> Result<String>;
}
