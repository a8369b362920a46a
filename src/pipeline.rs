use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::{debug, info};

use crate::core::metrics::character_error_rate;
use crate::core::model::{CerOutcome, RecognitionReport};
use crate::decoder::{DecodeConfig, Decoder, DecoderBridge, RequestStaging};
use crate::preprocess::resize_to_height;

/// Line height the decoder's model expects, in pixels.
pub const DEFAULT_TARGET_HEIGHT: u32 = 128;

/// External decode executable used when none is configured.
pub const DEFAULT_DECODER_PROGRAM: &str = "pylaia-htr-decode-ctc";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub decoder_program: String,
    pub base_config: PathBuf,
    pub target_height: u32,
}

impl PipelineConfig {
    pub fn new(decoder_program: String, base_config: PathBuf, target_height: u32) -> Self {
        Self {
            decoder_program,
            base_config,
            target_height,
        }
    }
}

/// One synchronous recognition run per call: normalize the image, stage the
/// per-request artifacts, invoke the decoder, score against the reference.
pub struct RecognitionPipeline {
    config: PipelineConfig,
    bridge: DecoderBridge,
}

impl RecognitionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let bridge = DecoderBridge::new(config.decoder_program.clone());
        Self { config, bridge }
    }

    pub fn recognize(
        &self,
        image: DynamicImage,
        reference: Option<&str>,
    ) -> Result<RecognitionReport> {
        let image = resize_to_height(image, self.config.target_height);
        debug!(
            width = image.width(),
            height = image.height(),
            "image normalized"
        );

        // The staging directory and everything in it disappears when this
        // scope exits, successful or not.
        let staging = RequestStaging::create()?;
        let base = DecodeConfig::load(&self.config.base_config)?;
        let config_path = staging.stage(&image, &base)?;

        let transcription = self.bridge.decode(&config_path)?;
        info!(
            chars = transcription.chars().count(),
            "transcription decoded"
        );

        let cer = match reference {
            Some(reference) => character_error_rate(&transcription, reference),
            None => CerOutcome::GroundTruthMissing,
        };

        Ok(RecognitionReport {
            transcription,
            cer,
        })
    }

    /// Load an image from disk and run `recognize` on it.
    pub fn recognize_file(
        &self,
        image_path: &Path,
        reference: Option<&str>,
    ) -> Result<RecognitionReport> {
        let image = image::open(image_path)
            .with_context(|| format!("failed to load image: {}", image_path.display()))?;
        self.recognize(image, reference)
    }
}
