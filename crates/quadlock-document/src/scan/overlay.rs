// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay rendering — tint the mask and stroke the detected quad so the user
// can see what the scanner is tracking.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use quadlock_core::config::OverlayConfig;
use quadlock_core::{DetectionResult, Point};

/// Mask probabilities above this are tinted.
const MASK_TINT_THRESHOLD: f32 = 0.5;

/// Paints masks and the accepted quad onto a mask-sized RGBA canvas.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    config: OverlayConfig,
}

impl OverlayRenderer {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    /// Render one frame.
    ///
    /// The canvas takes the first mask's size; with no results it is a single
    /// transparent pixel. Masks of a different size are skipped. The state
    /// colour switches from tracking to locked when `locked` is set.
    pub fn render(
        &self,
        results: &[DetectionResult],
        quad: Option<&[Point; 4]>,
        locked: bool,
    ) -> RgbaImage {
        let Some(first) = results.first() else {
            return RgbaImage::new(1, 1);
        };
        let (width, height) = first.mask.dimensions();
        let mut canvas = RgbaImage::new(width, height);

        let [r, g, b] = if locked {
            self.config.locked_color
        } else {
            self.config.tracking_color
        };
        let tint = Rgba([r, g, b, self.config.mask_alpha]);
        let stroke = Rgba([r, g, b, 255]);

        for result in results.iter().filter(|res| res.mask.dimensions() == (width, height)) {
            let data = result.mask.as_slice();
            for (i, &v) in data.iter().enumerate() {
                if v > MASK_TINT_THRESHOLD {
                    let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
                    canvas.put_pixel(x, y, tint);
                }
            }
        }

        if let Some(corners) = quad {
            self.stroke_polygon(&mut canvas, corners, stroke);
        }

        canvas
    }

    /// Closed outline of `stroke_width` pixels with rounded joins.
    fn stroke_polygon(&self, canvas: &mut RgbaImage, corners: &[Point; 4], color: Rgba<u8>) {
        let half = self.config.stroke_width as f64 / 2.0;
        let passes = self.config.stroke_width * 2;

        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            let len = a.distance(b);
            if len == 0.0 {
                continue;
            }
            let (nx, ny) = (-(b.y - a.y) / len, (b.x - a.x) / len);
            for k in 0..=passes {
                let offset = -half + k as f64 * 0.5;
                let start = ((a.x + nx * offset) as f32, (a.y + ny * offset) as f32);
                let end = ((b.x + nx * offset) as f32, (b.y + ny * offset) as f32);
                draw_line_segment_mut(canvas, start, end, color);
            }
        }

        let radius = (half.floor() as i32).max(0);
        for corner in corners {
            draw_filled_circle_mut(
                canvas,
                (corner.x.round() as i32, corner.y.round() as i32),
                radius,
                color,
            );
        }
    }
}
