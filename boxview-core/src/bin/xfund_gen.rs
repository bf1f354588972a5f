use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use boxview_core::{AppConfig, OcrClient, dataset::XfundGenerator};

#[derive(Parser)]
#[command(name = "xfund-gen")]
#[command(about = "Convert annotation exports into an XFUND-style dataset")]
struct Args {
    #[arg(long, help = "Annotation export (JSON array of tasks)")]
    studio: PathBuf,

    #[arg(long, help = "Folder with the annotated page images")]
    images: PathBuf,

    #[arg(short, long, help = "Output dataset path")]
    output: PathBuf,

    #[arg(short, long, help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override the OCR endpoint")]
    endpoint: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.ocr.endpoint = endpoint;
    }
    info!("using OCR endpoint {}", config.ocr.endpoint);

    let client = OcrClient::new(&config.ocr)?;
    let generator = XfundGenerator::new(client, config.ocr.skip_labels);
    let dataset = generator.run(&args.studio, &args.images, &args.output)?;

    let entities: usize = dataset
        .documents
        .iter()
        .map(|document| document.document.len())
        .sum();
    info!(
        "generated {} documents with {} entities",
        dataset.documents.len(),
        entities
    );
    Ok(())
}
