// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry helpers over `Point` sequences.

use crate::types::Point;

/// Area of a simple polygon via the shoelace formula.
///
/// Vertices may be in either winding order; the result is non-negative.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut twice = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice.abs() / 2.0
}

/// Area of the triangle `a`, `b`, `c`: half the absolute value of
/// `det [[ax, ay, 1], [bx, by, 1], [cx, cy, 1]]`.
pub fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// Falls back to the point distance when `a == b`.
pub fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let len = a.distance(b);
    if len == 0.0 {
        return p.distance(a);
    }
    2.0 * triangle_area(a, b, p) / len
}

/// Arithmetic mean of the vertices.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
    }

    #[test]
    fn shoelace_area_rectangle() {
        assert!((polygon_area(&rect(10.0, 5.0)) - 50.0).abs() < 1e-9);
        let mut reversed = rect(10.0, 5.0);
        reversed.reverse();
        assert!((polygon_area(&reversed) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_polygon_has_zero_area() {
        assert_eq!(polygon_area(&rect(10.0, 5.0)[..2]), 0.0);
    }

    #[test]
    fn collinear_points_have_zero_triangle_area() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(5.0, 5.0);
        let c = Point::new(10.0, 10.0);
        assert_eq!(triangle_area(a, b, c), 0.0);
    }

    #[test]
    fn perpendicular_distance_to_horizontal_line() {
        let d = perpendicular_distance(
            Point::new(3.0, 7.0),
            Point::new(0.0, 2.0),
            Point::new(10.0, 2.0),
        );
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_rectangle() {
        assert_eq!(centroid(&rect(4.0, 2.0)), Some(Point::new(2.0, 1.0)));
        assert_eq!(centroid(&[]), None);
    }
}
