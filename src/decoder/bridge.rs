use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::decoder::Decoder;

/// Invokes the external line decoder against a materialized config file.
///
/// Output is captured in-process per invocation; a failed run is a hard
/// error and can never be confused with the output of an earlier request.
#[derive(Debug, Clone)]
pub struct DecoderBridge {
    program: String,
}

impl DecoderBridge {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Decoder for DecoderBridge {
    fn decode(&self, config_path: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("--config")
            .arg(config_path)
            .output()
            .with_context(|| format!("failed to invoke {}; is it installed?", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "decoder {} failed with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(decoder = %self.program, raw = %stdout, "decoder output captured");
        parse_transcription(&stdout)
    }
}

/// Extract the transcription from decoder output: the last non-empty line,
/// split once on the first space. The head is the image identifier, which is
/// discarded.
pub fn parse_transcription(stdout: &str) -> Result<String> {
    let line = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("decoder produced no output"))?;

    let (_, transcription) = line
        .split_once(' ')
        .ok_or_else(|| anyhow::anyhow!("unexpected decoder output line: {line}"))?;

    Ok(transcription.to_string())
}
