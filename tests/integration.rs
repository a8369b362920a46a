use std::fs;

use anyhow::Result;

use htrline::catalog::{scan_examples, MISSING_REFERENCE};
use htrline::core::metrics::character_error_rate;
use htrline::core::model::CerOutcome;
use htrline::pipeline::{PipelineConfig, RecognitionPipeline, DEFAULT_TARGET_HEIGHT};
use htrline::preprocess::resize_to_height;
use htrline::web::page::render_page;

const BASE_CONFIG: &str = "\
syms: model/syms.txt
img_list: original_list.txt
img_dirs: []
common:
  experiment_dirname: model
  checkpoint: weights.ckpt
decode:
  join_string: ''
  convert_spaces: true
";

/// Full pipeline against a fake decoder script: a real image file goes in,
/// the staged config reaches the subprocess, and the transcription comes
/// back scored against a matching reference.
#[test]
#[cfg(unix)]
fn full_pipeline_with_fake_decoder() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;

    // The script checks that it was invoked the way the real decoder is and
    // that the materialized config actually exists on disk.
    let program = dir.path().join("fake-decoder.sh");
    fs::write(
        &program,
        "#!/bin/sh\n\
         if [ \"$1\" != \"--config\" ]; then echo 'missing --config' >&2; exit 2; fi\n\
         if [ ! -f \"$2\" ]; then echo \"config not found: $2\" >&2; exit 3; fi\n\
         echo 'loading model'\n\
         echo 'line_001 en gang til'\n",
    )?;
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755))?;

    let base_config = dir.path().join("decode_config.yaml");
    fs::write(&base_config, BASE_CONFIG)?;

    let image_path = dir.path().join("line_001.jpg");
    image::DynamicImage::new_rgb8(320, 64)
        .to_rgb8()
        .save(&image_path)?;

    let pipeline = RecognitionPipeline::new(PipelineConfig::new(
        program.to_str().unwrap().to_string(),
        base_config,
        DEFAULT_TARGET_HEIGHT,
    ));

    let report = pipeline.recognize_file(&image_path, Some("en gang til"))?;
    assert_eq!(report.transcription, "en gang til");
    assert_eq!(report.cer, CerOutcome::Score(0.0));

    // Same image without a reference reports the status, not a number.
    let report = pipeline.recognize_file(&image_path, None)?;
    assert_eq!(report.cer, CerOutcome::GroundTruthMissing);
    assert_eq!(report.cer.label(), "Ground truth not provided");

    Ok(())
}

/// A decoder that exits non-zero must fail the request; nothing from an
/// earlier run may leak into the result.
#[test]
#[cfg(unix)]
fn failing_decoder_surfaces_an_error() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;

    let program = dir.path().join("fake-decoder.sh");
    fs::write(
        &program,
        "#!/bin/sh\necho 'CUDA device not found' >&2\nexit 1\n",
    )?;
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755))?;

    let base_config = dir.path().join("decode_config.yaml");
    fs::write(&base_config, BASE_CONFIG)?;

    let image_path = dir.path().join("line_001.jpg");
    image::DynamicImage::new_rgb8(100, 50)
        .to_rgb8()
        .save(&image_path)?;

    let pipeline = RecognitionPipeline::new(PipelineConfig::new(
        program.to_str().unwrap().to_string(),
        base_config,
        DEFAULT_TARGET_HEIGHT,
    ));

    let err = pipeline
        .recognize_file(&image_path, Some("whatever"))
        .unwrap_err();
    assert!(
        format!("{err:#}").contains("CUDA device not found"),
        "stderr should be carried in the error: {err:#}"
    );

    Ok(())
}

/// Catalog scan plus page rendering: each pair ends up as one gallery card
/// with its reference attached.
#[test]
fn catalog_feeds_the_gallery() -> Result<()> {
    let dir = tempfile::tempdir()?;
    image::DynamicImage::new_rgb8(300, 60)
        .to_rgb8()
        .save(dir.path().join("line_01.jpg"))?;
    fs::write(dir.path().join("line_01.txt"), "en gang til\n")?;
    image::DynamicImage::new_rgb8(280, 60)
        .to_rgb8()
        .save(dir.path().join("line_02.jpg"))?;

    let pairs = scan_examples(dir.path())?;
    assert_eq!(pairs.len(), 2);

    let with_text = pairs
        .iter()
        .find(|p| p.name() == "line_01.jpg")
        .expect("line_01.jpg should be listed");
    assert_eq!(with_text.reference, "en gang til");
    let without_text = pairs
        .iter()
        .find(|p| p.name() == "line_02.jpg")
        .expect("line_02.jpg should be listed");
    assert_eq!(without_text.reference, MISSING_REFERENCE);

    let html = render_page(&pairs);
    assert_eq!(html.matches("class='example'").count(), 2);
    assert!(html.contains("en gang til"));

    Ok(())
}

/// The documented end-to-end resize scenario: a 64 px tall line scaled to a
/// 128 px model height doubles in width.
#[test]
fn resize_scenario_matches_contract() {
    let resized = resize_to_height(image::DynamicImage::new_rgb8(412, 64), 128);
    assert_eq!(resized.height(), 128);
    assert_eq!(resized.width(), 824);
}

#[test]
fn cer_contract_spot_checks() {
    assert_eq!(
        character_error_rate("en gang til", "en gang til"),
        CerOutcome::Score(0.0)
    );
    assert_eq!(
        character_error_rate("", "en gang til"),
        CerOutcome::GroundTruthMissing
    );
    assert_eq!(
        character_error_rate("en gang til", ""),
        CerOutcome::GroundTruthMissing
    );
}
