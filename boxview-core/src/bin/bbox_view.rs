use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use boxview_core::{
    AppConfig, DrawOptions, OcrBackend, OcrClient, PayloadShape, Renderer, Upload,
    average_confidence, normalize,
    visualize::{append_texts, list_inputs},
};

#[derive(Parser)]
#[command(name = "bbox-view")]
#[command(about = "Draw OCR detections onto every image of a directory")]
struct Args {
    #[arg(help = "Directory with input images")]
    input: PathBuf,

    #[arg(help = "Directory the annotated images are written to")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = PayloadShape::Markup, help = "Response format of the OCR backend")]
    shape: PayloadShape,

    #[arg(short, long, help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override the OCR endpoint")]
    endpoint: Option<String>,

    #[arg(long, help = "Overlay recognized text, needs a configured font")]
    text_view: bool,

    #[arg(long, help = "Do not draw box outlines")]
    no_boxes: bool,

    #[arg(long, help = "Append recognized texts to this file")]
    collect_text: Option<PathBuf>,
}

struct Visualizer {
    client: OcrClient,
    renderer: Renderer,
    shape: PayloadShape,
    options: DrawOptions,
    output_dir: PathBuf,
    text_file: Option<PathBuf>,
}

impl Visualizer {
    fn new(args: &Args) -> Result<Self> {
        let mut config = AppConfig::load_or_default(args.config.as_deref())?;
        if let Some(endpoint) = &args.endpoint {
            config.ocr.endpoint = endpoint.clone();
        }
        info!("using OCR endpoint {}", config.ocr.endpoint);

        let client = OcrClient::new(&config.ocr)?;
        let renderer = Renderer::new(&config.render)?;
        if args.text_view && !renderer.has_font() {
            warn!("--text-view without a font, set render.font_path or BOXVIEW_FONT_PATH");
        }

        std::fs::create_dir_all(&args.output)
            .with_context(|| format!("create output dir {}", args.output.display()))?;

        Ok(Self {
            client,
            renderer,
            shape: args.shape,
            options: DrawOptions {
                boxes: !args.no_boxes,
                text: args.text_view,
            },
            output_dir: args.output.clone(),
            text_file: args.collect_text.clone(),
        })
    }

    fn process(&self, path: &Path) -> Result<()> {
        let image =
            image::open(path).with_context(|| format!("decode image {}", path.display()))?;

        let payload = self.client.recognize(Upload::from_path(path)?)?;
        let normalized = normalize(&payload, self.shape, image.width(), image.height())?;
        info!(
            "{}: {} regions, {} skipped",
            path.display(),
            normalized.regions.len(),
            normalized.skipped
        );

        match average_confidence(&normalized.regions) {
            Ok(rec) => info!("{}: average confidence {:.4}", path.display(), rec),
            Err(err) => info!("{}: {}", path.display(), err),
        }

        let output_img = self
            .renderer
            .draw(&image, &normalized.regions, self.options);
        let file_name = path.file_name().context("input has no file name")?;
        let save_path = self.output_dir.join(file_name);
        output_img
            .save(&save_path)
            .with_context(|| format!("save {}", save_path.display()))?;
        info!("saved {}", save_path.display());

        if let Some(text_file) = &self.text_file {
            let lines = append_texts(text_file, normalized.texts())?;
            info!("appended {} lines to {}", lines, text_file.display());
        }

        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let visualizer = Visualizer::new(&args)?;

    let inputs = list_inputs(&args.input)?;
    info!("found {} images in {}", inputs.len(), args.input.display());

    let mut failed = 0;
    for path in &inputs {
        if let Err(err) = visualizer.process(path) {
            error!("{}: {:#}", path.display(), err);
            failed += 1;
        }
    }

    info!(
        "done, {} succeeded, {} failed",
        inputs.len() - failed,
        failed
    );
    Ok(())
}
