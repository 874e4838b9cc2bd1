// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — map mask-space corners onto a high-resolution
// capture, put them in canonical order, and warp the enclosed region onto a
// fixed-size portrait page.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use quadlock_core::config::{CornerOrder, RectifyConfig};
use quadlock_core::error::{QuadlockError, Result};
use quadlock_core::geometry::{centroid, triangle_area};
use quadlock_core::{BoundingBox, Point};
use tracing::{debug, info, instrument};

/// The flattened page and the high-res corners it was warped from.
#[derive(Debug, Clone)]
pub struct RectifiedOutput {
    pub image: RgbaImage,
    /// Source corners in capture space, ordered TL, TR, BR, BL.
    pub corners: [Point; 4],
}

/// Warps a detected document quad onto the canonical output rectangle.
///
/// The output size is fixed by configuration and does not follow the
/// document's own aspect ratio.
#[derive(Debug, Clone, Default)]
pub struct PerspectiveRectifier {
    config: RectifyConfig,
}

impl PerspectiveRectifier {
    pub fn new(config: RectifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.config
    }

    /// Rectify `image` using corners found on a mask of size `mask_size`.
    ///
    /// ## Pipeline
    ///
    /// 1. Scale each corner from mask space into `image` space, per axis
    /// 2. Order the corners TL, TR, BR, BL
    /// 3. Reject near-singular corner configurations
    /// 4. Estimate the homography onto the canonical rectangle
    /// 5. Resample through its inverse with bilinear interpolation
    #[instrument(skip(self, image, corners), fields(image = ?(image.width(), image.height())))]
    pub fn rectify(
        &self,
        image: &DynamicImage,
        corners: &[Point; 4],
        mask_size: (u32, u32),
    ) -> Result<RectifiedOutput> {
        let mapped = map_corners(corners, mask_size, (image.width(), image.height()))?;
        let ordered = order_corners(mapped, self.config.corner_order);
        self.warp(&image.to_rgba8(), ordered)
    }

    /// Warp `image` given corners already in capture space and TL, TR, BR, BL
    /// order.
    pub fn warp(&self, image: &RgbaImage, ordered: [Point; 4]) -> Result<RectifiedOutput> {
        check_non_degenerate(&ordered, self.config.min_corner_area)?;

        let (out_w, out_h) = (self.config.output_width, self.config.output_height);
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),
            (out_w as f32, 0.0),
            (out_w as f32, out_h as f32),
            (0.0, out_h as f32),
        ];
        let src: [(f32, f32); 4] = ordered.map(Into::into);

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            QuadlockError::DegenerateGeometry("projective transform is singular".into())
        })?;

        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgba(self.config.fill),
            &mut output,
        );

        info!(out_w, out_h, "Perspective rectification applied");
        Ok(RectifiedOutput {
            image: output,
            corners: ordered,
        })
    }
}

/// Scale corners from mask space into image space, independently per axis.
///
/// Fails with `InputShapeMismatch` when either size is zero or a corner lies
/// outside the mask (by more than one pixel), since that means the corners
/// and `mask_size` do not describe the same grid.
pub fn map_corners(
    corners: &[Point; 4],
    mask_size: (u32, u32),
    image_size: (u32, u32),
) -> Result<[Point; 4]> {
    let (mask_w, mask_h) = mask_size;
    let (img_w, img_h) = image_size;
    if mask_w == 0 || mask_h == 0 || img_w == 0 || img_h == 0 {
        return Err(QuadlockError::shape_mismatch(mask_size, image_size));
    }

    let (mw, mh) = (mask_w as f64, mask_h as f64);
    for p in corners {
        let inside = p.x.is_finite()
            && p.y.is_finite()
            && (-1.0..=mw + 1.0).contains(&p.x)
            && (-1.0..=mh + 1.0).contains(&p.y);
        if !inside {
            return Err(QuadlockError::InputShapeMismatch {
                expected: format!("corner within {mask_w}x{mask_h} mask"),
                actual: format!("({:.1}, {:.1})", p.x, p.y),
            });
        }
    }

    let (sx, sy) = (img_w as f64 / mw, img_h as f64 / mh);
    let mapped = corners.map(|p| p.scale(sx, sy));
    debug!(sx, sy, ?mapped, "Corners mapped to capture space");
    Ok(mapped)
}

/// Put four corners in TL, TR, BR, BL order.
pub fn order_corners(points: [Point; 4], order: CornerOrder) -> [Point; 4] {
    match order {
        CornerOrder::SortByY => order_by_rows(points),
        CornerOrder::Centroid => order_by_angle(points),
    }
}

/// Two smallest-y points form the top pair (sorted by x ascending), the other
/// two the bottom pair (sorted by x descending).
///
/// Ambiguous when the quad is rotated near 45°, where the y split no longer
/// separates top from bottom.
fn order_by_rows(mut points: [Point; 4]) -> [Point; 4] {
    points.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    let mut top = [points[0], points[1]];
    let mut bottom = [points[2], points[3]];
    top.sort_by(|a, b| a.x.total_cmp(&b.x));
    bottom.sort_by(|a, b| b.x.total_cmp(&a.x));
    [top[0], top[1], bottom[0], bottom[1]]
}

/// Clockwise (in image coordinates) by angle around the centroid, rotated so
/// the corner with the smallest `x + y` comes first.
fn order_by_angle(mut points: [Point; 4]) -> [Point; 4] {
    let Some(c) = centroid(&points) else {
        return points;
    };
    points.sort_by(|a, b| {
        let ta = (a.y - c.y).atan2(a.x - c.x);
        let tb = (b.y - c.y).atan2(b.x - c.x);
        ta.total_cmp(&tb)
    });
    let start = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x + a.y).total_cmp(&(b.x + b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    points.rotate_left(start);
    points
}

/// Reject corner sets that would make the homography singular.
///
/// Each triangle of three corners has area `|det| / 2` of its homogeneous
/// coordinate matrix; any triangle smaller than `min_area` means at least
/// three corners are (nearly) collinear or coincident.
pub fn check_non_degenerate(corners: &[Point; 4], min_area: f64) -> Result<()> {
    if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(QuadlockError::DegenerateGeometry(
            "corner coordinates are not finite".into(),
        ));
    }

    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    for (i, j, k) in TRIPLES {
        let area = triangle_area(corners[i], corners[j], corners[k]);
        if area < min_area {
            return Err(QuadlockError::DegenerateGeometry(format!(
                "corners {i}, {j}, {k} are nearly collinear (triangle area {area:.3})"
            )));
        }
    }
    Ok(())
}

/// Crop the region of a normalised bounding box out of `image`.
///
/// Left/top are clamped at zero and width/height at the image edge.
pub fn crop_to_bbox(image: &DynamicImage, bbox: &BoundingBox) -> Result<DynamicImage> {
    let (img_w, img_h) = (image.width() as i64, image.height() as i64);

    let left = ((bbox.x1 * img_w as f32) as i64).clamp(0, img_w);
    let top = ((bbox.y1 * img_h as f32) as i64).clamp(0, img_h);
    let width = (((bbox.x2 - bbox.x1) * img_w as f32) as i64).min(img_w - left);
    let height = (((bbox.y2 - bbox.y1) * img_h as f32) as i64).min(img_h - top);

    if width <= 0 || height <= 0 {
        return Err(QuadlockError::DegenerateGeometry(format!(
            "bounding box {bbox:?} covers no pixels"
        )));
    }

    debug!(
        left,
        top,
        width,
        height,
        normalized = bbox.is_normalized(),
        "Cropping to bounding box"
    );
    Ok(image.crop_imm(left as u32, top as u32, width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn corners_scale_per_axis() {
        let corners = [p(0.0, 0.0), p(450.0, 0.0), p(450.0, 600.0), p(0.0, 600.0)];
        let mapped = map_corners(&corners, (450, 600), (1800, 2400)).unwrap();
        assert_eq!(
            mapped,
            [p(0.0, 0.0), p(1800.0, 0.0), p(1800.0, 2400.0), p(0.0, 2400.0)]
        );
    }

    #[test]
    fn anisotropic_scaling() {
        let mapped = map_corners(
            &[p(10.0, 10.0), p(20.0, 10.0), p(20.0, 20.0), p(10.0, 20.0)],
            (100, 100),
            (400, 200),
        )
        .unwrap();
        assert_eq!(mapped[2], p(80.0, 40.0));
    }

    #[test]
    fn zero_mask_size_is_shape_mismatch() {
        let corners = [p(0.0, 0.0); 4];
        let err = map_corners(&corners, (0, 600), (1800, 2400)).unwrap_err();
        assert!(matches!(err, QuadlockError::InputShapeMismatch { .. }));
    }

    #[test]
    fn corner_outside_mask_is_shape_mismatch() {
        let corners = [p(0.0, 0.0), p(900.0, 0.0), p(450.0, 600.0), p(0.0, 600.0)];
        let err = map_corners(&corners, (450, 600), (1800, 2400)).unwrap_err();
        assert!(matches!(err, QuadlockError::InputShapeMismatch { .. }));
    }

    fn permutations(points: [Point; 4]) -> Vec<[Point; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        idx.iter().for_each(|&i| seen[i] = true);
                        if seen.iter().all(|&s| s) {
                            out.push(idx.map(|i| points[i]));
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn ordering_is_permutation_invariant() {
        let tl = p(12.0, 8.0);
        let tr = p(105.0, 15.0);
        let br = p(98.0, 140.0);
        let bl = p(6.0, 131.0);
        let perms = permutations([tl, tr, br, bl]);
        assert_eq!(perms.len(), 24);
        for order in [CornerOrder::SortByY, CornerOrder::Centroid] {
            for perm in &perms {
                assert_eq!(order_corners(*perm, order), [tl, tr, br, bl], "{order:?}");
            }
        }
    }

    #[test]
    fn centroid_ordering_handles_diamond() {
        // A square rotated by 45°: y-sorting pairs the top vertex with one
        // side vertex, the angular sort does not depend on that split.
        let top = p(50.0, 0.0);
        let right = p(100.0, 50.0);
        let bottom = p(50.0, 100.0);
        let left = p(0.0, 50.0);
        let ordered = order_corners([bottom, left, top, right], CornerOrder::Centroid);
        // Clockwise starting from the smallest x + y (tie between top and left
        // resolved by the angular order).
        let idx = ordered.iter().position(|q| *q == top).unwrap();
        assert_eq!(ordered[(idx + 1) % 4], right);
        assert_eq!(ordered[(idx + 2) % 4], bottom);
        assert_eq!(ordered[(idx + 3) % 4], left);
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let corners = [p(0.0, 0.0), p(10.0, 10.0), p(20.0, 20.0), p(0.0, 30.0)];
        let err = check_non_degenerate(&corners, 1.0).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn coincident_corners_fail_rectification() {
        let rectifier = PerspectiveRectifier::default();
        let image = DynamicImage::ImageRgba8(RgbaImage::new(400, 400));
        let corners = [p(10.0, 10.0); 4];
        let err = rectifier.rectify(&image, &corners, (100, 100)).unwrap_err();
        assert!(matches!(err, QuadlockError::DegenerateGeometry(_)));
    }

    #[test]
    fn axis_aligned_region_round_trips() {
        // 400x400 capture: the square (40..360)^2 holds four coloured quadrants
        // on a black background.
        let red = Rgba([255u8, 0, 0, 255]);
        let blue = Rgba([0u8, 0, 255, 255]);
        let green = Rgba([0u8, 255, 0, 255]);
        let white = Rgba([255u8, 255, 255, 255]);
        let capture = RgbaImage::from_fn(400, 400, |x, y| {
            let inside = (40..360).contains(&x) && (40..360).contains(&y);
            match (inside, x < 200, y < 200) {
                (false, _, _) => Rgba([0, 0, 0, 255]),
                (true, true, true) => red,
                (true, false, true) => blue,
                (true, true, false) => green,
                (true, false, false) => white,
            }
        });

        let rectifier = PerspectiveRectifier::new(RectifyConfig {
            output_width: 100,
            output_height: 100,
            ..RectifyConfig::default()
        });
        // Mask is a quarter of the capture; corners given in scrambled order.
        let corners = [p(90.0, 90.0), p(10.0, 10.0), p(10.0, 90.0), p(90.0, 10.0)];
        let out = rectifier
            .rectify(&DynamicImage::ImageRgba8(capture), &corners, (100, 100))
            .unwrap();

        assert_eq!(out.image.dimensions(), (100, 100));
        assert_eq!(out.corners[0], p(40.0, 40.0));
        assert_eq!(out.corners[2], p(360.0, 360.0));
        // Bilinear blending of equal neighbours may truncate 255 to 254.
        let assert_near = |x: u32, y: u32, expected: Rgba<u8>| {
            let got = out.image.get_pixel(x, y);
            for (g, e) in got.0.iter().zip(expected.0) {
                assert!(
                    (*g as i16 - e as i16).abs() <= 1,
                    "pixel ({x}, {y}) = {got:?}, expected {expected:?}"
                );
            }
        };
        assert_near(25, 25, red);
        assert_near(75, 25, blue);
        assert_near(25, 75, green);
        assert_near(75, 75, white);
        // No black background leaks in near the edges.
        assert_near(3, 3, red);
        assert_near(96, 96, white);
    }

    #[test]
    fn default_output_is_canonical_portrait() {
        let rectifier = PerspectiveRectifier::default();
        let capture = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            800,
            1000,
            Rgba([200, 200, 200, 255]),
        ));
        let corners = [p(20.0, 30.0), p(180.0, 25.0), p(185.0, 240.0), p(15.0, 235.0)];
        let out = rectifier.rectify(&capture, &corners, (200, 250)).unwrap();
        assert_eq!(out.image.dimensions(), (1200, 1650));
    }

    #[test]
    fn bbox_crop_clamps_to_image() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(200, 100));
        let cropped = crop_to_bbox(&image, &BoundingBox::new(0.5, 0.2, 1.0, 0.8)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (100, 60));

        let cropped = crop_to_bbox(&image, &BoundingBox::new(-0.1, 0.0, 0.5, 1.0)).unwrap();
        assert_eq!(cropped.width(), 120);
    }

    #[test]
    fn empty_bbox_is_rejected() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(200, 100));
        assert!(crop_to_bbox(&image, &BoundingBox::new(0.5, 0.5, 0.5, 0.9)).is_err());
    }
}
