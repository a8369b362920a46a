use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::model::ExamplePair;

/// Reference text substituted when an image has no sibling transcription.
pub const MISSING_REFERENCE: &str = "Transcription not found.";

const IMAGE_EXTENSION: &str = "jpg";
const REFERENCE_EXTENSION: &str = "txt";

/// Scan a directory for image/transcription pairs.
///
/// Every `*.jpg` file yields one pair; the reference is the trimmed contents
/// of the sibling `*.txt` file, or a fixed placeholder when that file does
/// not exist. Entries follow directory listing order. The scan runs once at
/// startup and the result is immutable afterwards.
pub fn scan_examples(dir: &Path) -> Result<Vec<ExamplePair>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list examples directory: {}", dir.display()))?;

    let mut pairs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        let is_image = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
        if !is_image {
            continue;
        }

        let reference_path = path.with_extension(REFERENCE_EXTENSION);
        let reference = match fs::read_to_string(&reference_path) {
            Ok(text) => text.trim().to_string(),
            Err(_) => {
                debug!(image = %path.display(), "no transcription file next to image");
                MISSING_REFERENCE.to_string()
            }
        };

        pairs.push(ExamplePair {
            image_path: path,
            reference,
        });
    }

    Ok(pairs)
}
