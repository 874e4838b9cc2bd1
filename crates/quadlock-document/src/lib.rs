// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quadlock-document — Document detection pipeline for Quadlock.
//
// Turns per-frame segmentation masks into a validated document quadrilateral,
// decides when that quadrilateral has held still long enough to trust, and
// rectifies the matching region of a high-resolution capture into a flat,
// canonical page image.

pub mod scan;

// Re-export the primary structs so callers can use `quadlock_document::ScanSession` etc.
pub use scan::extract::PolygonExtractor;
pub use scan::overlay::OverlayRenderer;
pub use scan::rectify::{PerspectiveRectifier, RectifiedOutput};
pub use scan::session::{DetectionState, ScanSession, SharedSession};
pub use scan::stability::{LockTransition, StabilityState, StabilityTracker};
