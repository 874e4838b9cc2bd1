// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — mask preparation, quad extraction, stability tracking,
// perspective rectification, and overlay rendering.

pub mod extract;
pub mod mask;
pub mod overlay;
pub mod rectify;
pub mod session;
pub mod stability;

pub use extract::PolygonExtractor;
pub use overlay::OverlayRenderer;
pub use rectify::PerspectiveRectifier;
pub use session::ScanSession;
pub use stability::StabilityTracker;
