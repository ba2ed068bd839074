// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// smartcropper — command-line front end: SSIM scoring of two images,
// perspective crop of a document quadrilateral and enhancement filters.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use image::DynamicImage;
use serde::Serialize;
use smartcropper_core::{AppConfig, ChannelOrder, CropPoint, Result, SmartCropperError};
use smartcropper_document::{Bitmap, DocumentEnhancer, SsimScorer, crop};
use tracing::{debug, info, warn};

/// Document photo cropping, enhancement and SSIM image similarity
#[derive(Parser, Debug)]
#[command(name = "smartcropper")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two images:
        smartcropper ssim before.png after.png

    Crop a photographed page:
        smartcropper crop photo.jpg page.png --points 12,30 610,22 640,860 5,870

    Binarize a page for printing:
        smartcropper enhance page.png clean.png --step all

EXIT CODES:
    0 - Success
    2 - Error (file not found, invalid image, invalid configuration, etc.)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mean structural similarity of two images (1.0 means identical)
    Ssim {
        /// First image
        #[arg(value_name = "A")]
        first: PathBuf,

        /// Second image
        #[arg(value_name = "B")]
        second: PathBuf,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Warp a quadrilateral onto an upright rectangle
    Crop {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Corners as X,Y: left-top, right-top, right-bottom, left-bottom
        #[arg(
            long,
            num_args = 4,
            required = true,
            allow_hyphen_values = true,
            value_name = "X,Y",
            value_parser = parse_point
        )]
        points: Vec<CropPoint>,
    },

    /// Apply document enhancement filters
    Enhance {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Filter to apply
        #[arg(long, value_enum, default_value = "all")]
        step: Step,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Step {
    /// Convert to grayscale
    Grayscale,
    /// Gaussian smoothing
    Denoise,
    /// Adaptive histogram equalisation
    Contrast,
    /// Adaptive threshold to black and white
    Binarize,
    /// Grayscale, denoise, contrast, then binarize
    All,
}

#[derive(Serialize)]
struct SsimOutput {
    score: f64,
    first: String,
    second: String,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Ssim {
            first,
            second,
            config,
            json,
        } => run_ssim(&first, &second, config.as_deref(), json),
        Command::Crop {
            input,
            output,
            points,
        } => run_crop(&input, &output, &points),
        Command::Enhance {
            input,
            output,
            step,
            config,
        } => run_enhance(&input, &output, step, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn run_ssim(first: &Path, second: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let score = score_files(first, second, config)?;
    info!(score, "Comparison finished");

    if json {
        let output = SsimOutput {
            score,
            first: first.display().to_string(),
            second: second.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{score:.6}");
    }
    Ok(())
}

/// Decode both files and score them. Layouts the scorer cannot read
/// directly (gray+alpha, 16-bit, float) are widened to RGBA first.
fn score_files(first: &Path, second: &Path, config: Option<&Path>) -> Result<f64> {
    let mut similarity = load_config(config)?.similarity;
    // Decoded files are always RGB.
    if config.is_some() && similarity.channel_order != ChannelOrder::Rgb {
        warn!(
            configured = ?similarity.channel_order,
            "Decoded files are RGB; ignoring configured channel_order"
        );
    }
    similarity.channel_order = ChannelOrder::Rgb;
    let scorer = SsimScorer::new(similarity)?;

    let a = Bitmap::open(first)?.into_scorable();
    let b = Bitmap::open(second)?.into_scorable();
    scorer.compute_similarity(&a.view()?, &b.view()?)
}

fn run_crop(input: &Path, output: &Path, points: &[CropPoint]) -> Result<()> {
    let quad: [CropPoint; 4] = points.try_into().map_err(|_| {
        SmartCropperError::InvalidQuad(format!(
            "expected 4 corners, got {}",
            points.len()
        ))
    })?;
    let source = Bitmap::open(input)?;
    let cropped = crop(source.as_dynamic(), quad)?;
    Bitmap::from_dynamic(DynamicImage::ImageRgba8(cropped)).save(output)?;
    info!(output = %output.display(), "Crop written");
    Ok(())
}

fn run_enhance(input: &Path, output: &Path, step: Step, config: Option<&Path>) -> Result<()> {
    let settings = load_config(config)?.enhance;
    let source = Bitmap::open(input)?.into_dynamic();
    let enhancer = DocumentEnhancer::with_config(source, settings)?;
    debug!(?step, "Applying enhancement");

    let enhanced = match step {
        Step::Grayscale => enhancer.grayscale(),
        Step::Denoise => enhancer.denoise(),
        Step::Contrast => enhancer.enhance_contrast(),
        Step::Binarize => enhancer.binarize(),
        Step::All => enhancer.process_document(),
    };
    Bitmap::from_dynamic(enhanced.into_dynamic()).save(output)?;
    info!(output = %output.display(), "Enhanced image written");
    Ok(())
}

/// Parse a corner given as `X,Y`.
fn parse_point(raw: &str) -> std::result::Result<CropPoint, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{raw}'"))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|err| format!("invalid x in '{raw}': {err}"))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|err| format!("invalid y in '{raw}': {err}"))?;
    Ok(CropPoint::new(x, y))
}
