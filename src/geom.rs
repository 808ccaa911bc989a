// geometry validation used by shape construction and mutation
//
// - polygons must stay simple (no bow-ties)
// - triangles must not degenerate into slivers

type Point = (f32, f32);

#[inline]
fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// shoelace area of a closed outline; positive when the points run clockwise on screen (y down)
pub fn signed_area<const N: usize>(pts: &[Point; N]) -> f32 {
    let twice: f32 = (0..N)
        .map(|i| {
            let (a, b) = (pts[i], pts[(i + 1) % N]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum();
    twice * 0.5
}

// segments ab and cd cross at a single interior point; touching or collinear overlap does not count
fn crosses(a: Point, b: Point, c: Point, d: Point) -> bool {
    const EPSILON: f32 = 1e-8;
    cross(a, b, c) * cross(a, b, d) < -EPSILON && cross(c, d, a) * cross(c, d, b) < -EPSILON
}

/// no two non-adjacent edges of the closed outline cross.
/// for a quadrilateral this is just the two pairs of opposite edges.
pub fn is_simple<const N: usize>(pts: &[Point; N]) -> bool {
    if N < 3 {
        return false;
    }
    (0..N).all(|i| {
        // edges i and k are adjacent when k == i + 1 or they wrap around
        (i + 2..N)
            .filter(|&k| (k + 1) % N != i)
            .all(|k| !crosses(pts[i], pts[(i + 1) % N], pts[k], pts[(k + 1) % N]))
    })
}

/// smallest interior angle of a triangle, in degrees.
/// degenerate triangles (coincident vertices) report 0.
pub fn min_triangle_angle(a: Point, b: Point, c: Point) -> f32 {
    fn angle_at(p: Point, q: Point, r: Point) -> f32 {
        let (ux, uy) = (q.0 - p.0, q.1 - p.1);
        let (vx, vy) = (r.0 - p.0, r.1 - p.1);
        let lu = (ux * ux + uy * uy).sqrt();
        let lv = (vx * vx + vy * vy).sqrt();
        if lu <= f32::EPSILON || lv <= f32::EPSILON {
            return 0.0;
        }
        let cos = ((ux * vx + uy * vy) / (lu * lv)).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }

    angle_at(a, b, c).min(angle_at(b, c, a)).min(angle_at(c, a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_area_orientation() {
        let a = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let b = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
        assert!(signed_area(&a) > 0.0);
        assert!(signed_area(&b) < 0.0);
    }

    #[test]
    fn test_bow_tie_rejected() {
        let pts = [(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)];
        assert!(!is_simple(&pts));
    }

    #[test]
    fn test_square_is_simple() {
        let pts = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(is_simple(&pts));
    }

    #[test]
    fn test_touching_outline_is_still_simple() {
        // vertex 2 sits on edge 0-1 without crossing it
        let touching = [(0.0, 0.0), (4.0, 0.0), (2.0, 0.0), (2.0, 3.0)];
        assert!(is_simple(&touching));
        assert_eq!(signed_area(&touching), 3.0);
        let tri = [(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)];
        assert!(is_simple(&tri));
        assert_eq!(signed_area(&tri), 4.5);
    }

    #[test]
    fn test_equilateral_angles() {
        let h = 3.0f32.sqrt() / 2.0;
        let a = min_triangle_angle((0.0, 0.0), (1.0, 0.0), (0.5, h));
        assert!((a - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_sliver_and_degenerate() {
        assert!(min_triangle_angle((0.0, 0.0), (100.0, 0.0), (50.0, 1.0)) < 15.0);
        assert_eq!(min_triangle_angle((1.0, 1.0), (1.0, 1.0), (5.0, 5.0)), 0.0);
    }
}
