use strsim::levenshtein;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

use crate::core::model::CerOutcome;

/// Character error rate between a predicted and a reference transcription.
///
/// Both strings are NFC-normalized before comparison so composed and
/// decomposed accent forms score identically. Returns `GroundTruthMissing`
/// instead of a number when either side is empty.
pub fn character_error_rate(prediction: &str, reference: &str) -> CerOutcome {
    if prediction.is_empty() || reference.trim().is_empty() {
        return CerOutcome::GroundTruthMissing;
    }

    let prediction: String = prediction.nfc().collect();
    let reference: String = reference.nfc().collect();

    let prediction_chars = prediction.chars().count();
    let reference_chars = reference.chars().count();
    // Diagnostic only; a length mismatch is expected for imperfect decodes.
    if prediction_chars != reference_chars {
        warn!(
            prediction_chars,
            reference_chars,
            %prediction,
            %reference,
            "prediction and reference lengths differ"
        );
    }

    let distance = levenshtein(&prediction, &reference);
    CerOutcome::Score(distance as f64 / reference_chars as f64)
}
