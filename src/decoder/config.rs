use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;
use serde_yaml::{Mapping, Value};
use tempfile::TempDir;

/// Config key naming the file that lists the images to decode.
pub const IMAGE_LIST_KEY: &str = "img_list";

const STAGED_IMAGE: &str = "line.jpg";
const STAGED_LIST: &str = "img_list.txt";
const STAGED_CONFIG: &str = "decode_config.yaml";

/// Base decoder configuration loaded from a YAML template.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    root: Mapping,
}

impl DecodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read decoder config: {}", path.display()))?;
        let root: Mapping = serde_yaml::from_str(&text)
            .with_context(|| format!("decoder config must be a YAML mapping: {}", path.display()))?;
        Ok(Self { root })
    }

    /// Serialize the config with only the image-list field overridden.
    pub fn with_image_list(&self, list_path: &Path) -> Result<String> {
        let list_path = list_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 staging path not supported"))?;

        let mut root = self.root.clone();
        root.insert(
            Value::String(IMAGE_LIST_KEY.to_string()),
            Value::String(list_path.to_string()),
        );
        Ok(serde_yaml::to_string(&root)?)
    }
}

/// Scoped temporary directory holding the per-request artifacts: the resized
/// image, the single-line image list, and the materialized decoder config.
///
/// Everything under it is removed when the value drops, on success and
/// failure alike.
#[derive(Debug)]
pub struct RequestStaging {
    dir: TempDir,
}

impl RequestStaging {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("htrline-")
            .tempdir()
            .context("failed to create request staging directory")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the three request artifacts and return the path of the config
    /// file to hand to the decoder.
    pub fn stage(&self, image: &DynamicImage, base_config: &DecodeConfig) -> Result<PathBuf> {
        let image_path = self.dir.path().join(STAGED_IMAGE);
        image
            .to_rgb8()
            .save(&image_path)
            .with_context(|| format!("failed to write staged image: {}", image_path.display()))?;

        let image_str = image_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 staging path not supported"))?;
        let list_path = self.dir.path().join(STAGED_LIST);
        fs::write(&list_path, format!("{image_str}\n"))
            .with_context(|| format!("failed to write image list: {}", list_path.display()))?;

        let config_path = self.dir.path().join(STAGED_CONFIG);
        let config_text = base_config.with_image_list(&list_path)?;
        fs::write(&config_path, config_text)
            .with_context(|| format!("failed to write staged config: {}", config_path.display()))?;

        Ok(config_path)
    }
}
