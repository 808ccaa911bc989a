// anti-aliased span rasterizer.
//
// paths are filled into a canvas-sized tiny-skia mask (nonzero winding, AA on)
// and read back as runs of equal coverage. only the path's pixel bounding box
// is cleared and scanned, so the cost follows the shape's footprint rather than
// the canvas. pixel centres sit at (x + 0.5, y + 0.5), the same convention the
// vector renderer uses, so search and output see the same geometry.

use tiny_skia as sk;

use crate::scanline::Scanline;

pub struct Rasterizer {
    width: u32,
    height: u32,
    // None for an empty canvas
    mask: Option<sk::Mask>,
}

impl Rasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, mask: sk::Mask::new(width, height) }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// fill a closed polygon and append its spans to `lines`
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], lines: &mut Vec<Scanline>) {
        if let Some(path) = polygon_path(points) {
            self.fill_path(&path, lines);
        }
    }

    /// stroke an open path with butt caps and append its spans to `lines`
    pub fn stroke_path(&mut self, path: &sk::Path, stroke_width: f32, lines: &mut Vec<Scanline>) {
        profiling::scope!("stroke_path");
        let stroke = sk::Stroke { width: stroke_width, ..sk::Stroke::default() };
        if let Some(outline) = path.stroke(&stroke, 1.0) {
            self.fill_path(&outline, lines);
        }
    }

    /// Fill `path` with anti-aliasing and append one span per run of equal
    /// coverage (row order, left to right, clipped to the canvas).
    pub fn fill_path(&mut self, path: &sk::Path, lines: &mut Vec<Scanline>) {
        profiling::scope!("fill_path");
        let Some(mask) = self.mask.as_mut() else {
            return;
        };
        let Some((x0, y0, x1, y1)) = pixel_bounds(path.bounds(), self.width, self.height) else {
            return;
        };
        let stride = self.width as usize;

        // leftovers from earlier fills may sit inside the box
        let data = mask.data_mut();
        for y in y0..=y1 {
            data[y * stride + x0..=y * stride + x1].fill(0);
        }
        mask.fill_path(path, sk::FillRule::Winding, true, sk::Transform::identity());

        let data = mask.data();
        for y in y0..=y1 {
            let row = &data[y * stride..(y + 1) * stride];
            let mut x = x0;
            while x <= x1 {
                let coverage = row[x];
                if coverage == 0 {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < x1 && row[x + 1] == coverage {
                    x += 1;
                }
                lines.push(Scanline::with_coverage(y as u32, start as u32, x as u32, coverage));
                x += 1;
            }
        }
    }
}

/// closed polygon path; None for fewer than three points or a degenerate outline
pub fn polygon_path(points: &[(f32, f32)]) -> Option<sk::Path> {
    if points.len() < 3 {
        return None;
    }
    let mut pb = sk::PathBuilder::new();
    pb.move_to(points[0].0, points[0].1);
    for &(x, y) in &points[1..] {
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

// inclusive pixel box around `r` (one pixel of slack for AA), clipped to the canvas
fn pixel_bounds(r: sk::Rect, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
    let x0 = (r.left().floor() as i64 - 1).max(0);
    let y0 = (r.top().floor() as i64 - 1).max(0);
    let x1 = (r.right().ceil() as i64 + 1).min(width as i64 - 1);
    let y1 = (r.bottom().ceil() as i64 + 1).min(height as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanline::{covered_pixels, FULL_COVERAGE};

    fn assert_well_formed(lines: &[Scanline], width: u32, height: u32) {
        for pair in lines.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.y <= b.y, "rows out of order: {:?} then {:?}", a, b);
            if a.y == b.y {
                assert!(a.x2 < b.x1, "overlapping spans: {:?} and {:?}", a, b);
            }
        }
        for l in lines {
            assert!(l.y < height && l.x1 <= l.x2 && l.x2 < width, "span out of bounds: {:?}", l);
            assert!(l.alpha > 0 && l.alpha <= FULL_COVERAGE, "bad coverage: {:?}", l);
        }
    }

    #[test]
    fn test_pixel_aligned_square_is_fully_covered() {
        let mut r = Rasterizer::new(8, 8);
        let mut lines = Vec::new();
        r.fill_polygon(&[(1.0, 1.0), (4.0, 1.0), (4.0, 4.0), (1.0, 4.0)], &mut lines);
        assert_well_formed(&lines, 8, 8);
        assert_eq!(covered_pixels(&lines), 9);
        assert!(lines.iter().all(|l| (1..=3).contains(&l.y) && l.x1 >= 1 && l.x2 <= 3));
        assert!(lines.iter().all(|l| l.alpha == FULL_COVERAGE));
    }

    #[test]
    fn test_diagonal_edge_has_partial_coverage() {
        let mut r = Rasterizer::new(32, 32);
        let mut lines = Vec::new();
        r.fill_polygon(&[(2.0, 2.0), (28.0, 2.0), (2.0, 28.0)], &mut lines);
        assert_well_formed(&lines, 32, 32);
        assert!(lines.iter().any(|l| l.alpha < FULL_COVERAGE));
        assert!(lines.iter().any(|l| l.alpha == FULL_COVERAGE && l.len() > 4));
    }

    #[test]
    fn test_winding_direction_does_not_matter() {
        let mut r = Rasterizer::new(16, 16);
        let mut ccw = Vec::new();
        let mut cw = Vec::new();
        r.fill_polygon(&[(2.0, 1.0), (12.0, 5.0), (4.0, 13.0)], &mut ccw);
        r.fill_polygon(&[(4.0, 13.0), (12.0, 5.0), (2.0, 1.0)], &mut cw);
        assert_eq!(ccw, cw);
        assert!(!ccw.is_empty());
    }

    #[test]
    fn test_reused_mask_forgets_previous_fill() {
        let mut r = Rasterizer::new(16, 16);
        let mut big = Vec::new();
        r.fill_polygon(&[(0.0, 0.0), (16.0, 0.0), (16.0, 16.0), (0.0, 16.0)], &mut big);
        let mut small = Vec::new();
        r.fill_polygon(&[(5.0, 5.0), (7.0, 5.0), (7.0, 7.0), (5.0, 7.0)], &mut small);
        assert_eq!(covered_pixels(&small), 4);
    }

    #[test]
    fn test_clipped_to_canvas() {
        let mut r = Rasterizer::new(10, 6);
        let mut lines = Vec::new();
        r.fill_polygon(&[(-20.0, -20.0), (40.0, -20.0), (40.0, 40.0), (-20.0, 40.0)], &mut lines);
        assert_well_formed(&lines, 10, 6);
        assert_eq!(covered_pixels(&lines), 60);
    }

    #[test]
    fn test_fully_outside_is_empty() {
        let mut r = Rasterizer::new(10, 10);
        let mut lines = Vec::new();
        r.fill_polygon(&[(20.0, 20.0), (30.0, 20.0), (25.0, 30.0)], &mut lines);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_self_overlapping_outline_is_not_double_counted() {
        // two overlapping squares traced as one contour
        let mut r = Rasterizer::new(20, 20);
        let mut lines = Vec::new();
        r.fill_polygon(
            &[(2.0, 2.0), (10.0, 2.0), (10.0, 10.0), (6.0, 10.0), (6.0, 6.0), (14.0, 6.0), (14.0, 14.0), (2.0, 14.0)],
            &mut lines,
        );
        assert_well_formed(&lines, 20, 20);
    }

    #[test]
    fn test_stroke_covers_line() {
        let mut r = Rasterizer::new(32, 32);
        let mut lines = Vec::new();
        let mut pb = sk::PathBuilder::new();
        pb.move_to(2.0, 16.0);
        pb.line_to(30.0, 16.0);
        let path = pb.finish().unwrap();
        r.stroke_path(&path, 2.0, &mut lines);
        assert_well_formed(&lines, 32, 32);
        // rows 15 and 16 lie inside the 2px band around y=16
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.x1 == 2 && l.x2 == 29 && l.alpha == FULL_COVERAGE));
    }

    #[test]
    fn test_empty_canvas_yields_nothing() {
        let mut r = Rasterizer::new(0, 0);
        let mut lines = Vec::new();
        r.fill_polygon(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)], &mut lines);
        assert!(lines.is_empty());
    }
}
