use image::{Rgba, RgbaImage};
use tiny_skia as sk;

use crate::error::{Error, Result};
use crate::shape::Shape;

/// a committed shape with the color it was drawn in
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placed {
    pub shape: Shape,
    pub color: Rgba<u8>,
}

/// Re-render committed shapes as anti-aliased vectors at `scale` times the
/// working resolution, over an opaque `background`.
pub fn render_shapes(
    width: u32,
    height: u32,
    background: Rgba<u8>,
    shapes: &[Placed],
    scale: f32,
) -> Result<RgbaImage> {
    profiling::scope!("render_shapes");

    let w = (width as f32 * scale).round() as u32;
    let h = (height as f32 * scale).round() as u32;
    let mut pix = sk::Pixmap::new(w, h).ok_or(Error::Canvas { width: w, height: h })?;

    let [r, g, b, a] = background.0;
    pix.fill(sk::Color::from_rgba8(r, g, b, a));

    let transform = sk::Transform::from_scale(scale, scale);
    for placed in shapes {
        draw_shape(&mut pix, placed, transform);
    }

    // tiny-skia stores premultiplied bytes
    let mut out = RgbaImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(pix.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(out)
}

fn draw_shape(pix: &mut sk::Pixmap, placed: &Placed, transform: sk::Transform) {
    profiling::scope!("draw_shape");
    let Some(path) = placed.shape.path() else {
        return;
    };

    let [r, g, b, a] = placed.color.0;
    let mut paint = sk::Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    match &placed.shape {
        Shape::Quadratic(q) => {
            let stroke = sk::Stroke { width: q.width, ..sk::Stroke::default() };
            pix.stroke_path(&path, &paint, &stroke, transform, None);
        }
        _ => pix.fill_path(&path, &paint, sk::FillRule::Winding, transform, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Circle, Quadratic, Rectangle};

    const BG: Rgba<u8> = Rgba([10, 20, 30, 255]);

    #[test]
    fn test_empty_render_is_background() {
        let im = render_shapes(8, 6, BG, &[], 2.0).unwrap();
        assert_eq!(im.dimensions(), (16, 12));
        assert!(im.pixels().all(|p| *p == BG));
    }

    #[test]
    fn test_opaque_rectangle_fills_scaled_area() {
        let placed = Placed {
            shape: Shape::Rectangle(Rectangle { x1: 2, y1: 2, x2: 5, y2: 5 }),
            color: Rgba([200, 100, 0, 255]),
        };
        let im = render_shapes(10, 10, BG, &[placed], 3.0).unwrap();
        // interior of the 4x4 block, scaled by 3
        assert_eq!(*im.get_pixel(10, 10), Rgba([200, 100, 0, 255]));
        assert_eq!(*im.get_pixel(2, 2), BG);
        assert_eq!(*im.get_pixel(25, 25), BG);
    }

    #[test]
    fn test_translucent_shapes_blend_over_background() {
        let placed = Placed { shape: Shape::Circle(Circle { x: 8, y: 8, r: 5 }), color: Rgba([255, 255, 255, 128]) };
        let im = render_shapes(16, 16, Rgba([0, 0, 0, 255]), &[placed], 1.0).unwrap();
        let p = im.get_pixel(8, 8);
        assert!((120..=136).contains(&p[0]), "got {:?}", p);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_stroke_draws_curve() {
        let q = Quadratic { p1: (2.0, 10.0), p2: (10.0, 10.0), p3: (18.0, 10.0), width: 4.0 };
        let placed = Placed { shape: Shape::Quadratic(q), color: Rgba([255, 0, 0, 255]) };
        let im = render_shapes(20, 20, BG, &[placed], 1.0).unwrap();
        assert_eq!(*im.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*im.get_pixel(10, 2), BG);
    }

    #[test]
    fn test_zero_scale_is_an_error() {
        assert!(matches!(render_shapes(10, 10, BG, &[], 0.0), Err(Error::Canvas { .. })));
    }
}
