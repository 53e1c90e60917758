use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use facematch_core::{EmbedderConfig, FaceEmbedder, MatchPolicy, OnnxFaceEmbedder, DEFAULT_MATCH_THRESHOLD};
use std::path::PathBuf;
use std::process::ExitCode;

mod detect;
mod pipe;

#[derive(Parser)]
#[command(name = "facematch", version, about = "KYC face comparison CLI")]
struct Cli {
    #[command(flatten)]
    models: ModelArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModelArgs {
    /// Directory containing det_10g.onnx and w600k_r50.onnx
    #[arg(long, global = true, env = "FACEMATCH_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads per model
    #[arg(long, global = true, env = "FACEMATCH_INTRA_THREADS", default_value_t = 2)]
    intra_threads: usize,
}

impl ModelArgs {
    fn embedder_config(&self) -> EmbedderConfig {
        EmbedderConfig {
            model_dir: self
                .model_dir
                .clone()
                .unwrap_or_else(facematch_core::default_model_dir),
            intra_threads: self.intra_threads.max(1),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Read {"aadhaarFaceImage", "liveImage"} from stdin, print one JSON result
    Compare {
        /// Similarity percent at or above which the faces match
        #[arg(long, env = "FACEMATCH_MATCH_THRESHOLD", default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f64,
    },
    /// Run face detection on an image file and print the detections
    Detect {
        /// Image file (PNG/JPEG bytes or base64 text)
        image: PathBuf,
    },
    /// Print the embedding of the most prominent face in an image file
    Embed {
        /// Image file (PNG/JPEG bytes or base64 text)
        image: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    // stdout is reserved for results; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let embedder_config = cli.models.embedder_config();

    match cli.command {
        Commands::Compare { threshold } => {
            let status = pipe::run(
                std::io::stdin().lock(),
                std::io::stdout().lock(),
                MatchPolicy::with_threshold(threshold),
                || OnnxFaceEmbedder::load(&embedder_config),
            )?;
            Ok(ExitCode::from(status.exit_code() as u8))
        }
        Commands::Detect { image } => {
            let img = detect::load_image(&image)?;
            let mut embedder = OnnxFaceEmbedder::load(&embedder_config)?;
            let faces = embedder.detector_mut().detect(&img)?;
            let report = detect::DetectReport::new(&img, faces);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Embed { image } => {
            let img = detect::load_image(&image)?;
            let mut embedder = OnnxFaceEmbedder::load(&embedder_config)?;
            match embedder.embed(&img)? {
                Some(embedding) => {
                    println!("{}", serde_json::to_string(&embedding)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("no face detected in {}", image.display());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
