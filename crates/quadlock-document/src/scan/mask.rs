// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mask preparation — binarization, nearest-neighbour rescaling, Gaussian
// smoothing, and conversion from 8-bit luma images.

use image::{GrayImage, Luma};
use quadlock_core::Mask;
use quadlock_core::error::{QuadlockError, Result};
use tracing::{debug, instrument};

/// Threshold a probability mask into a 0/255 image.
///
/// Pixels with probability strictly above `threshold` become 255.
pub fn binarize(mask: &Mask, threshold: f32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let data = mask.as_slice();
    GrayImage::from_fn(width, height, |x, y| {
        let v = data[y as usize * width as usize + x as usize];
        Luma([if v > threshold { 255u8 } else { 0u8 }])
    })
}

/// Interpret an 8-bit grayscale image as a probability mask (`value / 255`).
pub fn mask_from_luma(image: &GrayImage) -> Mask {
    Mask::from_fn(image.width(), image.height(), |x, y| {
        image.get_pixel(x, y).0[0] as f32 / 255.0
    })
}

/// Resample a mask to `target_width x target_height` by nearest neighbour.
///
/// Source indices use 16.16 fixed point, so the mapping truncates the same
/// way for every row: `src = (dst * ((orig << 16) / target)) >> 16`.
#[instrument(skip(mask), fields(from = ?mask.dimensions()))]
pub fn scale_mask(mask: &Mask, target_width: u32, target_height: u32) -> Result<Mask> {
    let (orig_w, orig_h) = mask.dimensions();
    if target_width == 0 || target_height == 0 || orig_w == 0 || orig_h == 0 {
        return Err(QuadlockError::shape_mismatch(
            (target_width, target_height),
            (orig_w, orig_h),
        ));
    }

    let x_ratio = ((orig_w as u64) << 16) / target_width as u64;
    let y_ratio = ((orig_h as u64) << 16) / target_height as u64;

    let scaled = Mask::from_fn(target_width, target_height, |x, y| {
        let src_x = ((x as u64 * x_ratio) >> 16) as u32;
        let src_y = ((y as u64 * y_ratio) >> 16) as u32;
        mask.get(src_x.min(orig_w - 1), src_y.min(orig_h - 1))
    });
    debug!(to = ?scaled.dimensions(), "Mask rescaled");
    Ok(scaled)
}

/// Smooth the foreground outline of a mask.
///
/// The mask is binarized at `> 0`, blurred with a normalised `kernel x kernel`
/// Gaussian (sigma 2), and re-thresholded at `> 0.9`. Pixels within
/// `kernel / 2` of the border keep their binarized value. The result holds
/// only 0.0 and 1.0.
#[instrument(skip(mask), fields(dims = ?mask.dimensions()))]
pub fn smooth_mask(mask: &Mask, kernel: usize) -> Mask {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    let binary: Vec<f32> = mask
        .as_slice()
        .iter()
        .map(|&v| if v > 0.0 { 1.0 } else { 0.0 })
        .collect();

    let weights = gaussian_kernel(kernel, 2.0);
    let offset = kernel / 2;

    let blurred_at = |x: usize, y: usize| -> f32 {
        if x < offset || y < offset || x + offset >= w || y + offset >= h {
            return binary[y * w + x];
        }
        let mut sum = 0.0;
        for ky in 0..kernel {
            let row = (y + ky - offset) * w;
            for kx in 0..kernel {
                sum += binary[row + x + kx - offset] * weights[ky * kernel + kx];
            }
        }
        sum
    };

    Mask::from_fn(width, height, |x, y| {
        if blurred_at(x as usize, y as usize) > 0.9 {
            1.0
        } else {
            0.0
        }
    })
}

/// Row-major `size x size` Gaussian kernel normalised to sum 1.
fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let mean = (size / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (0..size * size)
        .map(|i| {
            let dx = (i % size) as f32 - mean;
            let dy = (i / size) as f32 - mean;
            (-(dx * dx + dy * dy) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter_mut().for_each(|w| *w /= sum);
    }
    weights
}
