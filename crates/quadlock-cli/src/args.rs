// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the `quadlock` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quadlock_core::Point;

/// Lock onto a document in a stream of segmentation masks and flatten it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON scanner configuration; defaults apply to anything left out
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay grayscale mask PNGs as consecutive frames until the document locks
    Scan {
        /// Mask images, one per frame, in temporal order
        #[arg(required = true, value_name = "MASK")]
        masks: Vec<PathBuf>,

        /// High-resolution capture to rectify once locked
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Where to write the rectified page
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Directory to write per-frame overlay PNGs into
        #[arg(long, value_name = "DIR")]
        overlays: Option<PathBuf>,
    },

    /// Rectify an image from four known mask-space corners
    Rectify {
        /// Capture to rectify
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Corner as `x,y`; pass exactly four, in any order
        #[arg(long = "corner", value_name = "X,Y", num_args = 1, value_parser = parse_point)]
        corners: Vec<Point>,

        /// Size of the mask the corners were found on, as `WIDTHxHEIGHT`
        #[arg(long, value_name = "WxH", value_parser = parse_size)]
        mask_size: (u32, u32),

        /// Where to write the rectified page
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(Point::new(x, y))
}

pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected `WIDTHxHEIGHT`, got `{s}`"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width in `{s}`: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height in `{s}`: {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("mask size must be non-zero, got `{s}`"));
    }
    Ok((w, h))
}
