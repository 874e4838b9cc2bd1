// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Quadlock: masks, points, detected quads and the raw
// per-instance detection input.

use serde::{Deserialize, Serialize};

use crate::error::{QuadlockError, Result};

/// A 2-D point in floating-point pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale each axis independently.
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x as f32, p.y as f32)
    }
}

/// A quadrilateral that passed the 4-vertex and minimum-area gates.
///
/// `corners` are in mask coordinate space, in the winding order produced by
/// contour simplification (not canonicalised). `area` is the enclosed area of
/// the simplified 4-gon, not of the raw contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedQuad {
    pub corners: [Point; 4],
    pub area: f64,
}

/// Axis-aligned bounding box in normalised `0.0..=1.0` image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Whether all coordinates lie in `0..=1` and the box has positive extent.
    pub fn is_normalized(&self) -> bool {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        in_unit(self.x1)
            && in_unit(self.y1)
            && in_unit(self.x2)
            && in_unit(self.y2)
            && self.x2 > self.x1
            && self.y2 > self.y1
    }
}

/// Dense per-pixel foreground probability grid, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Mask {
    /// Wrap a row-major probability buffer.
    ///
    /// Fails with `InputShapeMismatch` when `data.len() != width * height`.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(QuadlockError::InputShapeMismatch {
                expected: format!("{expected} values for {width}x{height}"),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// An all-background mask.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Probability at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(
            x < self.width && y < self.height,
            "mask index ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Fail with `InputShapeMismatch` unless the mask is `width x height`.
    pub fn expect_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if self.dimensions() != (width, height) {
            return Err(QuadlockError::shape_mismatch(
                (width, height),
                self.dimensions(),
            ));
        }
        Ok(())
    }
}

/// One instance's raw inference output: a normalised box and its mask.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub bbox: BoundingBox,
    pub mask: Mask,
}

impl DetectionResult {
    pub fn new(bbox: BoundingBox, mask: Mask) -> Self {
        Self { bbox, mask }
    }
}
