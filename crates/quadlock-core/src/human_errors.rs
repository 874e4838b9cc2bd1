// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scanner UI.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the front end presents it (toast, banner, dialog).

use crate::error::QuadlockError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Will likely clear up on its own on the next frames.
    Transient,
    /// The user must do something (hold steadier, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying; an integration bug or broken file.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the scanner should keep trying on later frames.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `QuadlockError` into a `HumanError`.
pub fn humanize_error(err: &QuadlockError) -> HumanError {
    match err {
        QuadlockError::DegenerateGeometry(_) => HumanError {
            message: "We couldn't straighten this page.".into(),
            suggestion: "Hold the camera a little further back so all four corners of the page are visible.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuadlockError::NotLocked => HumanError {
            message: "The page isn't ready to capture yet.".into(),
            suggestion: "Hold the camera steady over the page until the outline turns green.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuadlockError::InputShapeMismatch { expected, actual } => HumanError {
            message: "The scanner received data it didn't expect.".into(),
            suggestion: format!(
                "Restart the scanner. If this keeps happening, the detection model may not match this app version. (expected {expected}, got {actual})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuadlockError::InvalidConfig(detail) => HumanError {
            message: "A scanner setting is invalid.".into(),
            suggestion: format!("Reset the scanner settings to their defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuadlockError::Io(_) => HumanError {
            message: "We couldn't read or write a file.".into(),
            suggestion: "Check that there is free storage space and that the app is allowed to access it.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuadlockError::Serialization(_) => HumanError {
            message: "The settings file is damaged.".into(),
            suggestion: "Delete the settings file to restore the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
