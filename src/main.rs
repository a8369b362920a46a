use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use htrline::catalog::scan_examples;
use htrline::pipeline::{
    PipelineConfig, RecognitionPipeline, DEFAULT_DECODER_PROGRAM, DEFAULT_TARGET_HEIGHT,
};
use htrline::web::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "htrline")]
#[command(version, about = "Handwritten text line recognition demo with CER scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct DecoderArgs {
    /// External decode executable to invoke
    #[arg(long, default_value = DEFAULT_DECODER_PROGRAM)]
    decoder: String,

    /// Base decoder configuration template (YAML)
    #[arg(long, default_value = "decode_config.yaml")]
    config: PathBuf,

    /// Line height expected by the recognition model, in pixels
    #[arg(long, default_value_t = DEFAULT_TARGET_HEIGHT)]
    height: u32,
}

impl DecoderArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(self.decoder.clone(), self.config.clone(), self.height)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the single-page demo server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 7860)]
        port: u16,

        /// Directory with example images and transcriptions
        #[arg(long, default_value = "examples")]
        examples: PathBuf,

        #[command(flatten)]
        decoder: DecoderArgs,
    },

    /// Recognize a single line image from the command line
    Recognize {
        /// Input line image
        image: PathBuf,

        /// Reference transcription to score against
        #[arg(short, long)]
        reference: Option<String>,

        #[command(flatten)]
        decoder: DecoderArgs,

        /// Print the transcription only
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the example pairs found in a directory
    Examples {
        /// Directory with example images and transcriptions
        #[arg(default_value = "examples")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            examples,
            decoder,
        } => {
            run_server(ServerConfig {
                host,
                port,
                examples_dir: examples,
                pipeline: decoder.pipeline_config(),
            })
            .await
        }
        Commands::Recognize {
            image,
            reference,
            decoder,
            quiet,
        } => recognize_single(image, reference, decoder, quiet),
        Commands::Examples { dir } => list_examples(dir),
    }
}

fn recognize_single(
    image: PathBuf,
    reference: Option<String>,
    decoder: DecoderArgs,
    quiet: bool,
) -> Result<()> {
    if !image.exists() {
        anyhow::bail!("input file does not exist: {}", image.display());
    }
    if !image.is_file() {
        anyhow::bail!("input is not a file: {}", image.display());
    }

    if !quiet {
        println!("[*] Image: {}", image.display());
        println!("[*] Decoder: {}", decoder.decoder);
    }

    let pipeline = RecognitionPipeline::new(decoder.pipeline_config());
    let report = pipeline
        .recognize_file(&image, reference.as_deref())
        .with_context(|| format!("failed to recognize {}", image.display()))?;

    if quiet {
        println!("{}", report.transcription);
    } else {
        println!("\n[+] Transcription: {}", report.transcription);
        println!("[+] CER: {}", report.cer.label());
    }

    Ok(())
}

fn list_examples(dir: PathBuf) -> Result<()> {
    let pairs = scan_examples(&dir)?;
    if pairs.is_empty() {
        println!("No example pairs found in {}", dir.display());
        return Ok(());
    }

    println!("Examples in {}", dir.display());
    println!("========");
    for pair in &pairs {
        println!("{}  {}", pair.name(), pair.reference);
    }
    println!("\n[*] {} pair(s)", pairs.len());

    Ok(())
}
