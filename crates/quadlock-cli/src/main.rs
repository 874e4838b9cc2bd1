// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadlock — command-line scanner
//
// Entry point. Initialises logging, loads the scanner configuration, and
// either replays a recorded mask sequence through a scan session or rectifies
// an image from explicit corners.

mod args;
mod frames;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use image::DynamicImage;
use quadlock_core::human_errors::humanize_error;
use quadlock_core::{Point, QuadlockError, ScannerConfig};
use quadlock_document::{LockTransition, PerspectiveRectifier, ScanSession};
use tracing::{info, warn};

use args::{Args, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let result = run(args);

    if let Err(err) = &result {
        if let Some(scan_err) = err.downcast_ref::<QuadlockError>() {
            let human = humanize_error(scan_err);
            eprintln!("{}\n{}", human.message, human.suggestion);
        }
    }
    result
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ScannerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScannerConfig::default(),
    };
    config.validate()?;

    match args.command {
        Command::Scan {
            masks,
            image,
            out,
            overlays,
        } => scan(config, &masks, &image, &out, overlays.as_deref()),
        Command::Rectify {
            image,
            corners,
            mask_size,
            out,
        } => rectify(config, &image, &corners, mask_size, &out),
    }
}

fn scan(
    config: ScannerConfig,
    masks: &[std::path::PathBuf],
    image_path: &Path,
    out: &Path,
    overlays: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = overlays {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating overlay directory {}", dir.display()))?;
    }

    let required = config.stability.required_stable_frames;
    let mut session = ScanSession::new(config);
    for (index, path) in masks.iter().enumerate() {
        let frame = frames::load_frame(path)?;
        let state = session.try_process(std::slice::from_ref(&frame))?;

        if let Some(dir) = overlays {
            let overlay_path = dir.join(format!("overlay_{index:04}.png"));
            state
                .overlay
                .save(&overlay_path)
                .with_context(|| format!("writing {}", overlay_path.display()))?;
        }

        if state.transition == Some(LockTransition::JustLocked) {
            info!(frame = index, area = state.area, "Locked; rectifying capture");
            let capture = open_image(image_path)?;
            let page = match session.rectify_capture(&capture) {
                Ok(output) => DynamicImage::ImageRgba8(output.image),
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "Rectification failed; falling back to bounding box crop");
                    session.capture_fallback(&capture)?
                }
                Err(err) => return Err(err.into()),
            };
            save_image(&page, out)?;
            session.complete_capture();
            return Ok(());
        }
    }

    bail!(
        "document never held still for {required} consecutive frames across {} masks",
        masks.len()
    )
}

fn rectify(
    config: ScannerConfig,
    image_path: &Path,
    corners: &[Point],
    mask_size: (u32, u32),
    out: &Path,
) -> Result<()> {
    let corners: [Point; 4] = corners
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected exactly 4 corners, got {}", corners.len()))?;

    let capture = open_image(image_path)?;
    let output = PerspectiveRectifier::new(config.rectify).rectify(&capture, &corners, mask_size)?;
    save_image(&DynamicImage::ImageRgba8(output.image), out)
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("reading image {}", path.display()))
}

fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    // JPEG has no alpha channel.
    let image = DynamicImage::ImageRgb8(image.to_rgb8());
    image
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "Page written");
    Ok(())
}
