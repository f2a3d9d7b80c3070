//! Page segmentation command line tool.
//!
//! Binarizes each input page, finds its text lines and writes the page and
//! line artifacts into the output directory.
//!
//! # Usage
//!
//! ```bash
//! oar-pageseg [OPTIONS] <IMAGES>...
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=info oar-pageseg -o out/ --threads 4 --gray scans/*.png
//! ```

use clap::Parser;
use oar_pageseg::core::config::{ConfigFormat, ConfigLoader, SegmentationConfig};
use oar_pageseg::core::debug::DirectorySink;
use oar_pageseg::pipeline::{BatchRunner, BatchStats, PageSegmenter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Command-line arguments for the page segmenter
#[derive(Parser)]
#[command(name = "oar-pageseg")]
#[command(about = "Segments scanned pages into text lines in reading order")]
struct Args {
    /// Paths to input page images
    #[arg(required_unless_present = "print_config")]
    images: Vec<PathBuf>,

    /// Directory to write page and line images into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for intermediate debug images
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Worker threads; 0 uses all cores
    #[arg(short, long)]
    threads: Option<usize>,

    /// Also write grayscale line images
    #[arg(long)]
    gray: bool,

    /// Write line boxes drawn over each page
    #[arg(long)]
    overlay: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    oar_pageseg::utils::init_tracing();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => SegmentationConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.batch.threads = threads;
    }
    config.extract.gray |= args.gray;
    config.batch.overlay |= args.overlay;

    if args.print_config {
        println!("{}", ConfigLoader::save_to_string(&config, ConfigFormat::Toml)?);
        return Ok(());
    }

    let mut segmenter = PageSegmenter::new(config)?;
    if let Some(dir) = &args.debug_dir {
        if args.images.len() > 1 {
            warn!("debug images of later pages overwrite earlier ones");
        }
        segmenter = segmenter.with_debug_sink(Arc::new(DirectorySink::new(dir)?));
    }

    let start = Instant::now();
    let runner = BatchRunner::new(segmenter, &args.output_dir);
    let reports = runner.run(&args.images)?;
    let stats = BatchStats::from_reports(&reports);
    info!("finished in {:?}", start.elapsed());
    print!("{stats}");

    for report in reports.iter().filter(|r| !r.is_success()) {
        if let Some(e) = &report.error {
            error!("{}: {}", report.path.display(), e);
        }
    }
    if stats.total_pages > 0 && stats.successful_pages == 0 {
        return Err("no page was segmented".into());
    }
    Ok(())
}
