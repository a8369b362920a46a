pub mod catalog;
pub mod core;
pub mod decoder;
pub mod pipeline;
pub mod preprocess;
pub mod web;

pub use crate::core::model::{CerOutcome, ExamplePair, RecognitionReport};
pub use crate::pipeline::{PipelineConfig, RecognitionPipeline};
