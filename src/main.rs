use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;

use tray_scan_lib::output::{write_detections_csv, DetectionRecord};
use tray_scan_lib::{
    get_image_files_in_dir, load_image, save_image, DetectorConfig, FileSink, TrayDetector,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "TrayScan - locate and crop food items on a tray photo")]
struct Args {
    /// Path to input image file or directory
    #[clap(short, long)]
    input: String,

    /// Path to output directory
    #[clap(short, long, default_value = "./output")]
    output: String,

    /// Path to a TOML configuration file (defaults are used when omitted)
    #[clap(short, long)]
    config: Option<String>,

    /// Save a side-by-side detection/mask overlay per input image
    #[clap(short, long)]
    debug: bool,

    /// Process directory entries one at a time instead of in parallel
    #[clap(long)]
    sequential: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration; the detector constructor re-validates it
    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => DetectorConfig::default(),
    };
    TrayDetector::new(config.clone()).context("invalid detector configuration")?;

    let output_base = PathBuf::from(&args.output);
    fs::create_dir_all(output_base.join("crops"))?;
    if args.debug {
        fs::create_dir_all(output_base.join("debug"))?;
    }

    let start_time = Instant::now();

    let input_path = PathBuf::from(&args.input);
    let mut records = Vec::new();

    if input_path.is_file() {
        println!("Processing single file: {}", input_path.display());
        records.extend(process_file(&input_path, &output_base, &config, args.debug)?);
    } else if input_path.is_dir() {
        println!("Processing directory: {}", input_path.display());
        let image_files = get_image_files_in_dir(&input_path)?;
        println!("Found {} image files", image_files.len());

        let results: Vec<_> = if args.sequential {
            image_files
                .iter()
                .map(|path| process_file(path, &output_base, &config, args.debug))
                .collect()
        } else {
            image_files
                .par_iter()
                .map(|path| process_file(path, &output_base, &config, args.debug))
                .collect()
        };

        for (path, result) in image_files.iter().zip(results) {
            match result {
                Ok(file_records) => records.extend(file_records),
                Err(e) => eprintln!("Error processing {}: {}", path.display(), e),
            }
        }
    } else {
        anyhow::bail!("invalid input path: {}", input_path.display());
    }

    let csv_path = output_base.join("detections.csv");
    write_detections_csv(&csv_path, &records)?;
    println!(
        "Wrote {} detection(s) to {}",
        records.len(),
        csv_path.display()
    );

    let elapsed = start_time.elapsed();
    println!("Processing completed in {:.2} seconds", elapsed.as_secs_f64());

    Ok(())
}

/// Detect items in one image, save its crops and optional debug overlay
fn process_file(
    path: &Path,
    output_base: &Path,
    config: &DetectorConfig,
    debug: bool,
) -> tray_scan_lib::Result<Vec<DetectionRecord>> {
    let input = load_image(path)?;

    // Each file gets its own detector so the debug overlay, when enabled,
    // lands at a path unique to this input
    let mut detector = TrayDetector::new(config.clone())?;
    if debug {
        let overlay_path = output_base
            .join("debug")
            .join(format!("{}_debug.png", input.filename));
        detector = detector.with_debug_sink(Box::new(FileSink::new(overlay_path)));
    }

    let detections = detector.detect(&input.image)?;
    if detections.is_empty() {
        println!("  {}: no items detected", input.filename);
        return Ok(Vec::new());
    }

    let mut records = Vec::with_capacity(detections.len());
    for (index, detection) in detections.iter().enumerate() {
        let position = index + 1;
        let crop_path = output_base
            .join("crops")
            .join(format!("{}_item_{}.png", input.filename, position));
        save_image(&detection.image, &crop_path)?;

        records.push(DetectionRecord::new(&input.filename, position, detection));
    }

    println!("  {}: {} item(s) detected", input.filename, detections.len());

    Ok(records)
}
