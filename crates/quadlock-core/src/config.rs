// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration. Every threshold here is a tuned value for a
// 160x160-class mask; retarget them together when the mask resolution changes.

use serde::{Deserialize, Serialize};

use crate::error::{QuadlockError, Result};

/// Polygon extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Probabilities strictly above this value are foreground.
    pub binarize_threshold: f32,
    /// Minimum enclosed contour area, in mask pixels².
    pub min_area: f64,
    /// Simplification tolerance as a fraction of the contour perimeter.
    pub epsilon_factor: f64,
    /// Gaussian smoothing kernel size applied before binarization, if any.
    pub smooth_kernel: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            binarize_threshold: 0.5,
            min_area: 2000.0,
            epsilon_factor: 0.02,
            smooth_kernel: None,
        }
    }
}

/// Stability tracking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Largest relative area change that still counts as "not moved".
    pub area_threshold: f64,
    /// Consecutive stable frames needed to lock.
    pub required_stable_frames: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            area_threshold: 0.10,
            required_stable_frames: 15,
        }
    }
}

/// How the four detected corners are put into TL, TR, BR, BL order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerOrder {
    /// Two smallest-y points are the top pair, then split each pair by x.
    #[default]
    SortByY,
    /// Sort by angle around the centroid, starting from the corner nearest
    /// the top-left. Tolerates rotations near 45°.
    Centroid,
}

/// Perspective rectification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Canonical output width in pixels.
    pub output_width: u32,
    /// Canonical output height in pixels.
    pub output_height: u32,
    pub corner_order: CornerOrder,
    /// Smallest allowed area (high-res px²) of any triangle formed by three
    /// of the four corners. Below this the transform is treated as singular.
    pub min_corner_area: f64,
    /// RGBA fill for output pixels that map outside the source image.
    pub fill: [u8; 4],
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            output_width: 1200,
            output_height: 1650,
            corner_order: CornerOrder::SortByY,
            min_corner_area: 1.0,
            fill: [255, 255, 255, 255],
        }
    }
}

/// Overlay colours and stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub tracking_color: [u8; 3],
    pub locked_color: [u8; 3],
    /// Alpha of the mask tint.
    pub mask_alpha: u8,
    /// Outline thickness in pixels.
    pub stroke_width: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            tracking_color: [255, 152, 0],
            locked_color: [76, 175, 80],
            mask_alpha: 100,
            stroke_width: 10,
        }
    }
}

/// Complete scanner settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub extraction: ExtractionConfig,
    pub stability: StabilityConfig,
    pub rectify: RectifyConfig,
    pub overlay: OverlayConfig,
}

impl ScannerConfig {
    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> Result<()> {
        let e = &self.extraction;
        if !(0.0..1.0).contains(&e.binarize_threshold) {
            return Err(invalid("extraction.binarize_threshold must be in [0, 1)"));
        }
        if !e.min_area.is_finite() || e.min_area < 0.0 {
            return Err(invalid("extraction.min_area must be finite and >= 0"));
        }
        if !e.epsilon_factor.is_finite() || e.epsilon_factor <= 0.0 {
            return Err(invalid("extraction.epsilon_factor must be > 0"));
        }
        if let Some(k) = e.smooth_kernel {
            if k == 0 || k % 2 == 0 {
                return Err(invalid("extraction.smooth_kernel must be odd and > 0"));
            }
        }

        let s = &self.stability;
        if !s.area_threshold.is_finite() || s.area_threshold < 0.0 {
            return Err(invalid("stability.area_threshold must be finite and >= 0"));
        }
        if s.required_stable_frames == 0 {
            return Err(invalid("stability.required_stable_frames must be >= 1"));
        }

        let r = &self.rectify;
        if r.output_width == 0 || r.output_height == 0 {
            return Err(invalid("rectify output size must be non-zero"));
        }
        if !r.min_corner_area.is_finite() || r.min_corner_area < 0.0 {
            return Err(invalid("rectify.min_corner_area must be finite and >= 0"));
        }

        if self.overlay.stroke_width == 0 {
            return Err(invalid("overlay.stroke_width must be >= 1"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> QuadlockError {
    QuadlockError::InvalidConfig(msg.to_string())
}
