//! Compositing and difference primitives shared by the worker and the model.
//!
//! All functions work on tightly packed, straight-alpha `RgbaImage` buffers of
//! identical dimensions and touch only the pixels named by the span list, so
//! their cost is proportional to the shape footprint, not the canvas.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::scanline::Scanline;

const M: u64 = 0xffff;

/// Closed-form color that minimizes squared error against `target` when drawn
/// over `current` at the given opacity, restricted to `lines`.
/// Returns transparent black when the span list covers no pixels.
pub fn compute_color(
    target: &RgbaImage,
    current: &RgbaImage,
    lines: &[Scanline],
    alpha: u8,
) -> Rgba<u8> {
    profiling::scope!("compute_color");
    debug_assert_eq!(target.dimensions(), current.dimensions());

    let width = target.width();
    let t = target.as_raw();
    let c = current.as_raw();
    // inverse opacity in 8.8 fixed point
    let a = 0x101 * 255 / alpha.max(1) as i64;

    let (mut rsum, mut gsum, mut bsum, mut count) = (0i64, 0i64, 0i64, 0i64);
    for line in lines {
        let range = line.byte_range(width);
        for (tp, cp) in t[range.clone()].chunks_exact(4).zip(c[range].chunks_exact(4)) {
            let (tr, tg, tb) = (tp[0] as i64, tp[1] as i64, tp[2] as i64);
            let (cr, cg, cb) = (cp[0] as i64, cp[1] as i64, cp[2] as i64);
            rsum += (tr - cr) * a + cr * 0x101;
            gsum += (tg - cg) * a + cg * 0x101;
            bsum += (tb - cb) * a + cb * 0x101;
            count += 1;
        }
    }

    if count == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let r = ((rsum / count) >> 8).clamp(0, 255) as u8;
    let g = ((gsum / count) >> 8).clamp(0, 255) as u8;
    let b = ((bsum / count) >> 8).clamp(0, 255) as u8;
    Rgba([r, g, b, alpha])
}

/// copy the pixels under `lines` from `src` into `dst`.
pub fn copy_lines(dst: &mut RgbaImage, src: &RgbaImage, lines: &[Scanline]) {
    profiling::scope!("copy_lines");
    debug_assert_eq!(dst.dimensions(), src.dimensions());

    let width = src.width();
    let src = src.as_raw();
    let dst: &mut [u8] = &mut **dst;
    for line in lines {
        let range = line.byte_range(width);
        dst[range.clone()].copy_from_slice(&src[range]);
    }
}

/// source-over `color` onto the pixels under `lines`, weighted by span coverage.
/// 16-bit math on premultiplied source channels.
pub fn draw_lines(im: &mut RgbaImage, color: Rgba<u8>, lines: &[Scanline]) {
    profiling::scope!("draw_lines");

    let [r, g, b, a] = color.0;
    let sa = a as u64 * 0x101;
    let sr = r as u64 * 0x101 * sa / M;
    let sg = g as u64 * 0x101 * sa / M;
    let sb = b as u64 * 0x101 * sa / M;

    let width = im.width();
    let pix: &mut [u8] = &mut **im;
    for line in lines {
        let ma = line.alpha as u64;
        let da = (M - sa * ma / M) * 0x101;
        for p in pix[line.byte_range(width)].chunks_exact_mut(4) {
            p[0] = ((p[0] as u64 * da + sr * ma) / M >> 8) as u8;
            p[1] = ((p[1] as u64 * da + sg * ma) / M >> 8) as u8;
            p[2] = ((p[2] as u64 * da + sb * ma) / M >> 8) as u8;
            p[3] = ((p[3] as u64 * da + sa * ma) / M >> 8) as u8;
        }
    }
}

#[inline]
fn squared_diff(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum()
}

/// root-mean-square difference over all RGBA channels, normalized to 0..=1.
pub fn difference_full(a: &RgbaImage, b: &RgbaImage) -> f64 {
    profiling::scope!("difference_full");
    debug_assert_eq!(a.dimensions(), b.dimensions());

    let (w, h) = a.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }

    // one row per rayon unit keeps the split cheap for small images
    let row_bytes = (w * 4) as usize;
    let total: u64 = a
        .as_raw()
        .par_chunks(row_bytes)
        .zip(b.as_raw().par_chunks(row_bytes))
        .map(|(x, y)| squared_diff(x, y))
        .sum();

    (total as f64 / (w as f64 * h as f64 * 4.0)).sqrt() / 255.0
}

/// Update a full-image score for a change confined to `lines`.
///
/// `score` is the `difference_full` of `target` vs `before`; the result is the
/// `difference_full` of `target` vs an image equal to `before` everywhere except
/// under `lines`, where it equals `after`. Pixels of `after` outside the spans
/// are never read.
pub fn difference_partial(
    target: &RgbaImage,
    before: &RgbaImage,
    after: &RgbaImage,
    score: f64,
    lines: &[Scanline],
) -> f64 {
    profiling::scope!("difference_partial");

    let (w, h) = target.dimensions();
    let denom = w as f64 * h as f64 * 4.0;
    let base = (score * 255.0).powi(2) * denom;

    let t = target.as_raw();
    let b = before.as_raw();
    let a = after.as_raw();
    let mut delta = 0i64;
    for line in lines {
        let range = line.byte_range(w);
        delta -= squared_diff(&t[range.clone()], &b[range.clone()]) as i64;
        delta += squared_diff(&t[range.clone()], &a[range]) as i64;
    }

    ((base + delta as f64).max(0.0) / denom).sqrt() / 255.0
}

/// mean color of an image (opaque), used as the starting canvas.
pub fn average_color(im: &RgbaImage) -> Rgba<u8> {
    profiling::scope!("average_color");

    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for p in im.pixels() {
        r += p[0] as u64;
        g += p[1] as u64;
        b += p[2] as u64;
    }
    let n = (im.width() as u64 * im.height() as u64).max(1);
    Rgba([(r / n) as u8, (g / n) as u8, (b / n) as u8, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(c))
    }

    #[test]
    fn test_difference_full_identical_is_zero() {
        let a = solid(5, 4, [10, 20, 30, 255]);
        assert_eq!(difference_full(&a, &a.clone()), 0.0);
    }

    #[test]
    fn test_difference_full_black_white_is_one_for_rgb() {
        let a = solid(3, 3, [0, 0, 0, 255]);
        let b = solid(3, 3, [255, 255, 255, 255]);
        // 3 of 4 channels differ by 255
        let expected = (3.0f64 / 4.0).sqrt();
        assert!((difference_full(&a, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_opaque_fit_matches_target() {
        let target = solid(4, 4, [200, 100, 50, 255]);
        let current = solid(4, 4, [0, 0, 0, 255]);
        let lines = vec![Scanline::new(1, 0, 3), Scanline::new(2, 0, 3)];
        let c = compute_color(&target, &current, &lines, 255);
        assert_eq!(c, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_empty_lines_color_is_transparent() {
        let target = solid(2, 2, [1, 2, 3, 255]);
        assert_eq!(compute_color(&target, &target, &[], 128), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_opaque_replaces_pixels() {
        let mut im = solid(4, 2, [0, 0, 0, 255]);
        draw_lines(&mut im, Rgba([9, 99, 199, 255]), &[Scanline::new(0, 1, 2)]);
        assert_eq!(im.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(im.get_pixel(1, 0), &Rgba([9, 99, 199, 255]));
        assert_eq!(im.get_pixel(2, 0), &Rgba([9, 99, 199, 255]));
        assert_eq!(im.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_draw_half_alpha_blends() {
        let mut im = solid(1, 1, [0, 0, 0, 255]);
        draw_lines(&mut im, Rgba([255, 255, 255, 128]), &[Scanline::new(0, 0, 0)]);
        let p = im.get_pixel(0, 0);
        assert!((127..=129).contains(&p[0]), "got {:?}", p);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_copy_lines_only_touches_spans() {
        let src = solid(3, 3, [7, 7, 7, 255]);
        let mut dst = solid(3, 3, [1, 1, 1, 255]);
        copy_lines(&mut dst, &src, &[Scanline::new(1, 1, 1)]);
        assert_eq!(dst.get_pixel(1, 1), &Rgba([7, 7, 7, 255]));
        assert_eq!(dst.get_pixel(0, 1), &Rgba([1, 1, 1, 255]));
    }

    #[test]
    fn test_partial_matches_full() {
        let target = solid(6, 5, [120, 60, 30, 255]);
        let before = solid(6, 5, [0, 0, 0, 255]);
        let lines = vec![Scanline::new(0, 0, 5), Scanline::new(3, 2, 4)];
        let mut after = before.clone();
        draw_lines(&mut after, Rgba([120, 60, 30, 200]), &lines);

        let score = difference_full(&target, &before);
        let partial = difference_partial(&target, &before, &after, score, &lines);
        let full = difference_full(&target, &after);
        assert!((partial - full).abs() < 1e-9, "partial {} vs full {}", partial, full);
        assert!(partial < score);
    }

    #[test]
    fn test_average_color() {
        let mut im = solid(2, 1, [0, 0, 0, 255]);
        im.put_pixel(1, 0, Rgba([200, 100, 50, 255]));
        assert_eq!(average_color(&im), Rgba([100, 50, 25, 255]));
    }
}
