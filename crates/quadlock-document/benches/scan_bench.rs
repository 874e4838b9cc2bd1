// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-frame scanning path: quad extraction from
// a segmentation mask, and rectification of a locked capture.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};

use quadlock_core::{BoundingBox, DetectionResult, Mask, Point, ScannerConfig};
use quadlock_document::{PerspectiveRectifier, PolygonExtractor, ScanSession};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 160x160 mask with a filled rectangle from (20, 30) to (140, 130).
fn rect_mask() -> Mask {
    Mask::from_fn(160, 160, |x, y| {
        if (20..140).contains(&x) && (30..130).contains(&y) { 0.9 } else { 0.05 }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Contour tracing plus polygon simplification on a model-sized mask. This
/// runs once per camera frame, so it is the latency that matters.
fn bench_extraction(c: &mut Criterion) {
    let mask = rect_mask();
    let extractor = PolygonExtractor::default();

    c.bench_function("extract_quad (160x160)", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&mask))));
    });
}

/// One full frame through the session: extraction, tracking and overlay.
fn bench_session_frame(c: &mut Criterion) {
    let results = vec![DetectionResult::new(
        BoundingBox::new(0.125, 0.1875, 0.875, 0.8125),
        rect_mask(),
    )];
    let mut session = ScanSession::new(ScannerConfig::default());

    c.bench_function("session_frame (160x160)", |b| {
        b.iter(|| {
            let state = session.process(black_box(&results));
            // Keep the tracker from locking so every iteration does the same work.
            session.restart();
            black_box(state)
        });
    });
}

/// Warp a 640x640 capture onto the default 1200x1650 page.
fn bench_rectification(c: &mut Criterion) {
    let capture = DynamicImage::ImageRgba8(RgbaImage::from_fn(640, 640, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    }));
    let corners = [
        Point::new(20.0, 30.0),
        Point::new(139.0, 30.0),
        Point::new(139.0, 129.0),
        Point::new(20.0, 129.0),
    ];
    let rectifier = PerspectiveRectifier::default();

    c.bench_function("rectify (640x640 -> 1200x1650)", |b| {
        b.iter(|| black_box(rectifier.rectify(black_box(&capture), &corners, (160, 160))));
    });
}

criterion_group!(
    benches,
    bench_extraction,
    bench_session_frame,
    bench_rectification
);
criterion_main!(benches);
