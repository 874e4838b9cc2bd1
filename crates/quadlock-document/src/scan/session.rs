// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session — the per-frame driver that ties extraction, stability
// tracking, overlay rendering and rectification together.
//
// Frames are delivered synchronously, one call per frame, in temporal order.
// `SharedSession` is the single mutation point when frames are produced on one
// thread and consumed on another.

use std::sync::{Arc, Mutex, PoisonError};

use image::{DynamicImage, RgbaImage};
use quadlock_core::error::{QuadlockError, Result};
use quadlock_core::{BoundingBox, DetectionResult, Point, ScannerConfig, ValidatedQuad};
use tracing::{debug, error, info, instrument};

use super::extract::PolygonExtractor;
use super::overlay::OverlayRenderer;
use super::rectify::{PerspectiveRectifier, RectifiedOutput, crop_to_bbox, order_corners};
use super::stability::{LockTransition, StabilityState, StabilityTracker};

/// Per-frame summary handed to the UI.
#[derive(Debug, Clone)]
pub struct DetectionState {
    pub overlay: RgbaImage,
    pub found: bool,
    /// Area of the accepted quad, 0.0 when none was found.
    pub area: f64,
    /// Corners of the accepted quad in mask space, ordered TL, TR, BR, BL
    /// by the configured corner ordering.
    pub corners: Option<[Point; 4]>,
    /// `None` while a capture is in progress and the tracker is paused.
    pub transition: Option<LockTransition>,
}

/// Everything retained from the frame that produced the lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockedFrame {
    /// Mask-space corners, ordered TL, TR, BR, BL.
    pub corners: [Point; 4],
    pub area: f64,
    pub bbox: BoundingBox,
    /// Mask size the corners were found on.
    pub mask_size: (u32, u32),
}

/// Owns the scanner state for one camera stream.
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    extractor: PolygonExtractor,
    tracker: StabilityTracker,
    rectifier: PerspectiveRectifier,
    renderer: OverlayRenderer,
    capturing: bool,
    locked: Option<LockedFrame>,
}

impl ScanSession {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            extractor: PolygonExtractor::new(config.extraction),
            tracker: StabilityTracker::new(config.stability),
            rectifier: PerspectiveRectifier::new(config.rectify),
            renderer: OverlayRenderer::new(config.overlay),
            capturing: false,
            locked: None,
        }
    }

    /// Process one frame's detection results.
    ///
    /// Fails with `InputShapeMismatch` when the masks in one frame disagree
    /// on size; the tracker is left untouched in that case.
    #[instrument(skip_all, fields(results = results.len()))]
    pub fn try_process(&mut self, results: &[DetectionResult]) -> Result<DetectionState> {
        if let Some(first) = results.first() {
            let (w, h) = first.mask.dimensions();
            for result in &results[1..] {
                result.mask.expect_dimensions(w, h)?;
            }
        }

        let order = self.rectifier.config().corner_order;
        let best = self.best_quad(results).map(|(quad, index)| {
            let corners = order_corners(quad.corners, order);
            (ValidatedQuad { corners, ..quad }, index)
        });
        let was_locked = self.tracker.is_locked();
        let overlay = self.renderer.render(
            results,
            best.as_ref().map(|(quad, _)| &quad.corners),
            was_locked,
        );

        let found = best.is_some();
        let area = best.as_ref().map_or(0.0, |(quad, _)| quad.area);

        let transition = if self.capturing {
            debug!("Capture in progress; stability update skipped");
            None
        } else {
            let transition = self.tracker.update(found, area);
            if let (LockTransition::JustLocked, Some((quad, index))) = (transition, &best) {
                let result = &results[*index];
                self.locked = Some(LockedFrame {
                    corners: quad.corners,
                    area: quad.area,
                    bbox: result.bbox,
                    mask_size: result.mask.dimensions(),
                });
                self.capturing = true;
                info!(area = quad.area, "Document locked; capture requested");
            }
            Some(transition)
        };

        Ok(DetectionState {
            overlay,
            found,
            area,
            corners: best.map(|(quad, _)| quad.corners),
            transition,
        })
    }

    /// Infallible form of [`try_process`](Self::try_process).
    ///
    /// A mismatched frame is logged at error level and reported as "nothing
    /// found" without touching the tracker.
    pub fn process(&mut self, results: &[DetectionResult]) -> DetectionState {
        self.try_process(results).unwrap_or_else(|err| {
            error!(error = %err, "Frame rejected");
            DetectionState {
                overlay: RgbaImage::new(1, 1),
                found: false,
                area: 0.0,
                corners: None,
                transition: None,
            }
        })
    }

    /// Largest-area quad over all masks, with the index of its result.
    fn best_quad(&self, results: &[DetectionResult]) -> Option<(ValidatedQuad, usize)> {
        results
            .iter()
            .enumerate()
            .filter_map(|(i, result)| self.extractor.extract(&result.mask).map(|q| (q, i)))
            .fold(None, |best: Option<(ValidatedQuad, usize)>, (quad, i)| match best {
                Some((b, _)) if b.area >= quad.area => best,
                _ => Some((quad, i)),
            })
    }

    /// Warp the locked region of a freshly captured high-resolution image.
    pub fn rectify_capture(&self, image: &DynamicImage) -> Result<RectifiedOutput> {
        let locked = self.locked.ok_or(QuadlockError::NotLocked)?;
        self.rectifier
            .rectify(image, &locked.corners, locked.mask_size)
    }

    /// Crop the locked detection's bounding box out of `image`.
    ///
    /// Used when the quad is too degenerate to rectify.
    pub fn capture_fallback(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let locked = self.locked.ok_or(QuadlockError::NotLocked)?;
        crop_to_bbox(image, &locked.bbox)
    }

    /// Finish the current capture and resume tracking from scratch.
    ///
    /// The locked frame is kept until the next lock replaces it.
    pub fn complete_capture(&mut self) {
        info!("Capture complete; tracking resumed");
        self.capturing = false;
        self.tracker.reset();
    }

    /// Drop all state, as when the scanner is reopened.
    pub fn restart(&mut self) {
        info!("Scan session restarted");
        self.capturing = false;
        self.locked = None;
        self.tracker.reset();
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn locked_frame(&self) -> Option<&LockedFrame> {
        self.locked.as_ref()
    }

    pub fn stability(&self) -> StabilityState {
        self.tracker.state()
    }
}

/// A `ScanSession` behind a mutex, cloneable across threads.
///
/// Each frame takes the lock once for its whole update, so observations are
/// applied atomically and in the order callers acquire the lock.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<ScanSession>>,
}

impl SharedSession {
    pub fn new(session: ScanSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session.
    ///
    /// A poisoned lock is recovered: the session holds plain data that is
    /// always left in a consistent state between frames.
    pub fn with<R>(&self, f: impl FnOnce(&mut ScanSession) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn process(&self, results: &[DetectionResult]) -> Result<DetectionState> {
        self.with(|session| session.try_process(results))
    }
}
