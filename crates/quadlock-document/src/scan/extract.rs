// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon extraction — find the largest external contour of a probability mask
// that simplifies to exactly four vertices.

use image::GrayImage;
use image::imageops::replace;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{arc_length, contour_area as enclosed_area};
use quadlock_core::config::ExtractionConfig;
use quadlock_core::geometry::{perpendicular_distance, polygon_area};
use quadlock_core::{Mask, Point, ValidatedQuad};
use tracing::{debug, instrument};

use super::mask::{binarize, smooth_mask};

/// An accepted quad together with the raw contour it was simplified from.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCandidate {
    pub quad: ValidatedQuad,
    /// Boundary pixels of the connected component, in tracing order.
    pub contour: Vec<Point>,
    /// Enclosed area of the raw contour (before simplification).
    pub contour_area: f64,
}

/// Converts one probability mask into at most one validated quadrilateral.
///
/// ## Pipeline
///
/// 1. Optional Gaussian smoothing of the mask outline
/// 2. Binarize at `binarize_threshold`
/// 3. Trace external contours (holes and components nested in holes are ignored)
/// 4. Rank contours by enclosed area, largest first
/// 5. For each contour with area >= `min_area`, simplify with tolerance
///    `epsilon_factor * perimeter`; the first one that yields exactly four
///    vertices wins
///
/// A 3- or 5+-vertex simplification is a rejection, never an approximation.
#[derive(Debug, Clone, Default)]
pub struct PolygonExtractor {
    config: ExtractionConfig,
}

impl PolygonExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Find the document quad in `mask`, or `None` if no contour qualifies.
    pub fn extract(&self, mask: &Mask) -> Option<ValidatedQuad> {
        self.extract_candidate(mask).map(|candidate| candidate.quad)
    }

    /// Like [`extract`](Self::extract) but also returns the source contour.
    #[instrument(skip_all, fields(dims = ?mask.dimensions()))]
    pub fn extract_candidate(&self, mask: &Mask) -> Option<QuadCandidate> {
        let smoothed;
        let source = match self.config.smooth_kernel {
            Some(kernel) => {
                smoothed = smooth_mask(mask, kernel);
                &smoothed
            }
            None => mask,
        };

        let binary = binarize(source, self.config.binarize_threshold);
        let mut ranked = external_contours(&binary);

        if ranked.is_empty() {
            debug!("No foreground contours");
            return None;
        }

        ranked.sort_by(|a, b| b.area.total_cmp(&a.area));

        // Sorted descending, so the first undersized contour ends the search.
        for traced in ranked
            .into_iter()
            .take_while(|traced| traced.area >= self.config.min_area)
        {
            let TracedContour {
                points: contour,
                area: contour_area,
                perimeter,
            } = traced;
            let epsilon = self.config.epsilon_factor * perimeter;
            let approx = simplify_closed(&contour, epsilon);

            if let [a, b, c, d] = approx[..] {
                let corners = [a, b, c, d];
                let area = polygon_area(&corners);
                debug!(contour_area, area, epsilon, "Quad accepted");
                return Some(QuadCandidate {
                    quad: ValidatedQuad { corners, area },
                    contour,
                    contour_area,
                });
            }

            debug!(
                contour_area,
                vertices = approx.len(),
                "Contour rejected: not a quadrilateral"
            );
        }

        None
    }
}

/// One traced outer boundary with its enclosed area and closed length.
struct TracedContour {
    points: Vec<Point>,
    area: f64,
    perimeter: f64,
}

/// Outer borders of top-level foreground components.
///
/// The binary image is traced inside a one-pixel background frame so that
/// components touching the image edge (or filling it) still produce an outer
/// border; coordinates are shifted back into mask space.
fn external_contours(binary: &GrayImage) -> Vec<TracedContour> {
    let mut padded = GrayImage::new(binary.width() + 2, binary.height() + 2);
    replace(&mut padded, binary, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|mut c| {
            for p in &mut c.points {
                p.x -= 1;
                p.y -= 1;
            }
            TracedContour {
                area: enclosed_area(&c.points),
                perimeter: arc_length(&c.points, true),
                points: c
                    .points
                    .iter()
                    .map(|p| Point::new(p.x as f64, p.y as f64))
                    .collect(),
            }
        })
        .collect()
}

/// Douglas–Peucker simplification of a closed curve.
///
/// The curve is split at an approximate diameter (two mutually distant
/// points, found by three farthest-point hops from the first vertex). Both
/// split points are kept and each half is simplified as an open chain.
/// Points deviating from their chord by at most `epsilon` are dropped.
pub fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let farthest_from = |origin: usize| -> usize {
        let mut best = origin;
        let mut best_dist = 0.0;
        for (i, p) in points.iter().enumerate() {
            let d = p.distance(points[origin]);
            if d > best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    };

    let mut start = 0;
    let mut end = farthest_from(start);
    for _ in 0..2 {
        let next = farthest_from(end);
        start = end;
        end = next;
    }
    if start == end {
        // Every point coincides.
        return vec![points[start]];
    }

    // Two chains start..=end and end..=start, walking forward around the ring.
    let chain = |from: usize, to: usize| -> Vec<Point> {
        let len = (to + n - from) % n + 1;
        (0..len).map(|k| points[(from + k) % n]).collect()
    };

    let mut result = simplify_open(&chain(start, end), epsilon);
    let second = simplify_open(&chain(end, start), epsilon);
    // `second` begins with `end` (already present) and finishes with `start`.
    result.extend_from_slice(&second[1..second.len() - 1]);
    result
}

/// Douglas–Peucker simplification of an open chain. Endpoints are always kept.
pub fn simplify_open(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut index = first;
        let mut max_dist = 0.0;
        for i in first + 1..last {
            let d = perpendicular_distance(points[i], points[first], points[last]);
            if d > max_dist {
                index = i;
                max_dist = d;
            }
        }
        if max_dist > epsilon {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}
