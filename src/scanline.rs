/// full coverage for a span (16-bit, same scale as the compositing math)
pub const FULL_COVERAGE: u32 = 0xffff;

/// a horizontal run of pixels `x1..=x2` on row `y` with uniform coverage.
/// spans produced by the rasterizer and shapes are always clipped to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scanline {
    pub y: u32,
    pub x1: u32,
    pub x2: u32,
    pub alpha: u32,
}

impl Scanline {
    #[inline]
    pub fn new(y: u32, x1: u32, x2: u32) -> Self {
        Self { y, x1, x2, alpha: FULL_COVERAGE }
    }

    /// span with 8-bit mask coverage widened to the 16-bit scale
    #[inline]
    pub fn with_coverage(y: u32, x1: u32, x2: u32, coverage: u8) -> Self {
        Self { y, x1, x2, alpha: coverage as u32 * 0x101 }
    }

    /// number of pixels covered by this span
    #[inline]
    pub fn len(&self) -> usize {
        (self.x2 - self.x1 + 1) as usize
    }

    /// byte range of this span inside a tightly packed RGBA buffer of the given width
    #[inline]
    pub fn byte_range(&self, width: u32) -> std::ops::Range<usize> {
        let row = self.y as usize * width as usize;
        (row + self.x1 as usize) * 4..(row + self.x2 as usize + 1) * 4
    }

    /// clip a signed span to the canvas. returns None when nothing is left.
    #[inline]
    pub fn clipped(y: i32, x1: i32, x2: i32, width: u32, height: u32) -> Option<Self> {
        if y < 0 || y >= height as i32 {
            return None;
        }
        let x1 = x1.max(0);
        let x2 = x2.min(width as i32 - 1);
        if x1 > x2 {
            return None;
        }
        Some(Self::new(y as u32, x1 as u32, x2 as u32))
    }
}

/// total number of pixels covered by a span list
pub fn covered_pixels(lines: &[Scanline]) -> usize {
    lines.iter().map(Scanline::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipped_inside() {
        let s = Scanline::clipped(3, 2, 5, 10, 10).unwrap();
        assert_eq!(s, Scanline::new(3, 2, 5));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_clipped_partially_outside() {
        let s = Scanline::clipped(0, -4, 20, 10, 10).unwrap();
        assert_eq!((s.x1, s.x2), (0, 9));
    }

    #[test]
    fn test_clipped_fully_outside() {
        assert!(Scanline::clipped(-1, 0, 5, 10, 10).is_none());
        assert!(Scanline::clipped(10, 0, 5, 10, 10).is_none());
        assert!(Scanline::clipped(2, 11, 15, 10, 10).is_none());
        assert!(Scanline::clipped(2, -8, -1, 10, 10).is_none());
    }

    #[test]
    fn test_coverage_widens_to_16_bits() {
        assert_eq!(Scanline::with_coverage(0, 0, 0, 255).alpha, FULL_COVERAGE);
        assert_eq!(Scanline::with_coverage(0, 0, 0, 128).alpha, 0x8080);
    }

    #[test]
    fn test_byte_range_on_huge_canvas() {
        // 2^31 pixels overflows u32 byte offsets
        let width = 1u32 << 16;
        let s = Scanline::new(1 << 15, 0, 0);
        let start = (1usize << 31) * 4;
        assert_eq!(s.byte_range(width), start..start + 4);
    }

    #[test]
    fn test_byte_range() {
        let s = Scanline::new(1, 2, 3);
        assert_eq!(s.byte_range(4), 24..32);
    }
}
