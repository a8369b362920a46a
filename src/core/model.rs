use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Status string reported when CER cannot be computed.
pub const GROUND_TRUTH_MISSING: &str = "Ground truth not provided";

/// One image/reference pair discovered in the examples directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplePair {
    pub image_path: PathBuf,
    pub reference: String,
}

impl ExamplePair {
    /// Display name of the pair, derived from the image file name.
    pub fn name(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of CER scoring for one recognition run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CerOutcome {
    /// Edit distance divided by reference length.
    Score(f64),
    /// Prediction or reference was empty, so there is no number to report.
    GroundTruthMissing,
}

impl CerOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            CerOutcome::Score(value) => Some(*value),
            CerOutcome::GroundTruthMissing => None,
        }
    }

    /// Text shown in the CER field of the UI and the CLI output.
    pub fn label(&self) -> String {
        match self {
            CerOutcome::Score(value) => format!("{value:.3}"),
            CerOutcome::GroundTruthMissing => GROUND_TRUTH_MISSING.to_string(),
        }
    }
}

/// Final result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RecognitionReport {
    pub transcription: String,
    pub cer: CerOutcome,
}
