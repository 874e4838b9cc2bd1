// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quadlock.
//
// "No quad in this frame" has no variant: extraction returns `Option` and the
// stability tracker consumes the `found` flag directly.

use thiserror::Error;

/// Top-level error type for all Quadlock operations.
#[derive(Debug, Error)]
pub enum QuadlockError {
    // -- Geometry --
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("no locked document to capture")]
    NotLocked,

    // -- Integration --
    #[error("input shape mismatch: expected {expected}, got {actual}")]
    InputShapeMismatch { expected: String, actual: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuadlockError {
    /// Build an `InputShapeMismatch` from two `width x height` pairs.
    pub fn shape_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::InputShapeMismatch {
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Whether the same call may succeed on a later frame.
    ///
    /// Only degenerate corner geometry qualifies; everything else is a caller
    /// contract violation or an environment failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateGeometry(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuadlockError>;
