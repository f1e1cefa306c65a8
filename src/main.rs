use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use devscan::{report, OcrsRecognizer, RecognizerOptions, ScanConfig, ScanPipeline};

#[derive(Parser)]
#[command(name = "devscan")]
#[command(about = "Read device names and IP addresses from a network console screenshot")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON file overriding the detection constants
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prefer hardware acceleration for recognition
    #[arg(long)]
    gpu: bool,

    /// Directory with text-detection.rten and text-recognition.rten
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Skip OCR step (list detected panels only)
    #[arg(long)]
    skip_ocr: bool,

    /// Also write the result lines to a text file
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    save: Option<Option<PathBuf>>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// devices_YYYYMMDD_HHMMSS.txt in local time (UTC if the offset is unknown)
fn default_dump_path() -> anyhow::Result<PathBuf> {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let format = time::format_description::parse("[year][month][day]_[hour][minute][second]")?;
    Ok(PathBuf::from(format!("devices_{}.txt", now.format(&format)?)))
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    let recognizer = Arc::new(OcrsRecognizer::new(RecognizerOptions {
        use_gpu: args.gpu,
        model_dir: args.model_dir.clone(),
    }));

    let mut pipeline = ScanPipeline::new(config, recognizer)?;
    if let Some(debug_dir) = args.debug_out.clone() {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let lines = if args.skip_ocr {
        pipeline.panel_lines_for_path(&args.image_path)?
    } else {
        pipeline.display_lines_for_path(&args.image_path)?
    };

    for line in &lines {
        println!("{}", line);
    }

    if let Some(target) = args.save {
        let path = match target {
            Some(path) => path,
            None => default_dump_path()?,
        };
        report::write_dump(&path, &lines)?;
        eprintln!("Saved to {}", path.display());
    }

    Ok(())
}
