// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading recorded segmentation masks as detection results.

use std::path::Path;

use anyhow::{Context, Result};
use quadlock_core::{BoundingBox, DetectionResult, Mask};
use quadlock_document::scan::mask::mask_from_luma;

/// Pixels above this probability count towards the bounding box.
const BBOX_THRESHOLD: f32 = 0.5;

/// Read a grayscale PNG as one frame's detection.
pub fn load_frame(path: &Path) -> Result<DetectionResult> {
    let image = image::open(path)
        .with_context(|| format!("reading mask {}", path.display()))?
        .to_luma8();
    let mask = mask_from_luma(&image);
    let bbox = mask_bbox(&mask);
    Ok(DetectionResult::new(bbox, mask))
}

/// Normalised extent of the foreground pixels, or an empty box at the origin.
pub fn mask_bbox(mask: &Mask) -> BoundingBox {
    let (w, h) = mask.dimensions();
    let mut extent: Option<(u32, u32, u32, u32)> = None;
    for y in 0..h {
        for x in 0..w {
            if mask.get(x, y) > BBOX_THRESHOLD {
                extent = Some(match extent {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
    }
    match extent {
        Some((x0, y0, x1, y1)) => BoundingBox::new(
            x0 as f32 / w as f32,
            y0 as f32 / h as f32,
            (x1 + 1) as f32 / w as f32,
            (y1 + 1) as f32 / h as f32,
        ),
        None => BoundingBox::default(),
    }
}
