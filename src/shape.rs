// geometric primitives.
//
// every variant knows how to build itself randomly inside the canvas, how to
// mutate itself for local search, and how to rasterize itself into spans. all
// variants are small plain-data structs so candidate states copy for free.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom::{is_simple, min_triangle_angle, signed_area};
use tiny_skia as sk;

use crate::raster::{polygon_path, Rasterizer};
use crate::scanline::Scanline;

/// how far (in pixels) vertices may wander outside the canvas during mutation
const MARGIN: f32 = 16.0;
/// scale of a single positional mutation step (pixels)
const STEP: f32 = 16.0;
/// scale of a single rotation mutation step (degrees)
const ANGLE_STEP: f32 = 32.0;
/// mutations are retried until the shape is valid; this bounds the retries
const MAX_MUTATE_ATTEMPTS: usize = 1000;
pub const POLYGON_ORDER: usize = 4;

/// shape selector. `Any` is the "pick one for me" sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    #[default]
    Any,
    Triangle,
    Rectangle,
    Ellipse,
    Circle,
    RotatedRectangle,
    Quadratic,
    RotatedEllipse,
    Polygon,
}

impl ShapeType {
    pub const CONCRETE: [ShapeType; 8] = [
        ShapeType::Triangle,
        ShapeType::Rectangle,
        ShapeType::Ellipse,
        ShapeType::Circle,
        ShapeType::RotatedRectangle,
        ShapeType::Quadratic,
        ShapeType::RotatedEllipse,
        ShapeType::Polygon,
    ];

    /// numeric mode as used on the command line (1..=8); anything else means `Any`
    pub fn from_mode(mode: u32) -> Self {
        match mode {
            1 => ShapeType::Triangle,
            2 => ShapeType::Rectangle,
            3 => ShapeType::Ellipse,
            4 => ShapeType::Circle,
            5 => ShapeType::RotatedRectangle,
            6 => ShapeType::Quadratic,
            7 => ShapeType::RotatedEllipse,
            8 => ShapeType::Polygon,
            _ => ShapeType::Any,
        }
    }

    #[inline]
    pub fn is_concrete(self) -> bool {
        self != ShapeType::Any
    }

    /// map a selector to a concrete variant in one step: concrete selectors pass
    /// through, `Any` draws uniformly from the eight variants.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> ShapeType {
        if self.is_concrete() {
            self
        } else {
            Self::CONCRETE[rng.random_range(0..Self::CONCRETE.len())]
        }
    }
}

#[inline]
fn jitter<R: Rng + ?Sized>(rng: &mut R, scale: f32) -> f32 {
    rng.random_range(-scale..scale)
}

#[inline]
fn jitter_i<R: Rng + ?Sized>(rng: &mut R, scale: i32) -> i32 {
    rng.random_range(-scale..=scale)
}

#[inline]
fn rotate(x: f32, y: f32, degrees: f32) -> (f32, f32) {
    let (s, c) = degrees.to_radians().sin_cos();
    (x * c - y * s, x * s + y * c)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub points: [(f32, f32); 3],
}

impl Triangle {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        let x = rng.random::<f32>() * width as f32;
        let y = rng.random::<f32>() * height as f32;
        let mut t = Triangle {
            points: [
                (x, y),
                (x + jitter(rng, 16.0), y + jitter(rng, 16.0)),
                (x + jitter(rng, 16.0), y + jitter(rng, 16.0)),
            ],
        };
        if !t.is_valid() {
            t.mutate(rng, width, height);
        }
        t
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        for _ in 0..MAX_MUTATE_ATTEMPTS {
            let p = &mut self.points[rng.random_range(0..3)];
            p.0 = (p.0 + jitter(rng, STEP)).clamp(-MARGIN, w - 1.0 + MARGIN);
            p.1 = (p.1 + jitter(rng, STEP)).clamp(-MARGIN, h - 1.0 + MARGIN);
            if self.is_valid() {
                return;
            }
        }
    }

    /// reject slivers: every interior angle must exceed 15 degrees
    pub fn is_valid(&self) -> bool {
        let [a, b, c] = self.points;
        min_triangle_angle(a, b, c) > 15.0
    }
}

/// axis-aligned rectangle over whole pixels, corners inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rectangle {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        let (w, h) = (width as i32, height as i32);
        let x1 = rng.random_range(0..w);
        let y1 = rng.random_range(0..h);
        Rectangle {
            x1,
            y1,
            x2: (x1 + rng.random_range(1..=32)).clamp(0, w - 1),
            y2: (y1 + rng.random_range(1..=32)).clamp(0, h - 1),
        }
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as i32, height as i32);
        if rng.random_bool(0.5) {
            self.x1 = (self.x1 + jitter_i(rng, STEP as i32)).clamp(0, w - 1);
            self.y1 = (self.y1 + jitter_i(rng, STEP as i32)).clamp(0, h - 1);
        } else {
            self.x2 = (self.x2 + jitter_i(rng, STEP as i32)).clamp(0, w - 1);
            self.y2 = (self.y2 + jitter_i(rng, STEP as i32)).clamp(0, h - 1);
        }
    }

    /// corners ordered (min, max)
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (
            self.x1.min(self.x2),
            self.y1.min(self.y2),
            self.x1.max(self.x2),
            self.y1.max(self.y2),
        )
    }
}

/// axis-aligned ellipse centred on a pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ellipse {
    pub x: i32,
    pub y: i32,
    pub rx: i32,
    pub ry: i32,
}

impl Ellipse {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        Ellipse {
            x: rng.random_range(0..width as i32),
            y: rng.random_range(0..height as i32),
            rx: rng.random_range(1..=32),
            ry: rng.random_range(1..=32),
        }
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as i32, height as i32);
        match rng.random_range(0..3) {
            0 => {
                self.x = (self.x + jitter_i(rng, STEP as i32)).clamp(0, w - 1);
                self.y = (self.y + jitter_i(rng, STEP as i32)).clamp(0, h - 1);
            }
            1 => self.rx = (self.rx + jitter_i(rng, STEP as i32)).clamp(1, (w - 1).max(1)),
            _ => self.ry = (self.ry + jitter_i(rng, STEP as i32)).clamp(1, (h - 1).max(1)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub x: i32,
    pub y: i32,
    pub r: i32,
}

impl Circle {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        Circle {
            x: rng.random_range(0..width as i32),
            y: rng.random_range(0..height as i32),
            r: rng.random_range(1..=32),
        }
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as i32, height as i32);
        if rng.random_bool(0.5) {
            self.x = (self.x + jitter_i(rng, STEP as i32)).clamp(0, w - 1);
            self.y = (self.y + jitter_i(rng, STEP as i32)).clamp(0, h - 1);
        } else {
            self.r = (self.r + jitter_i(rng, STEP as i32)).clamp(1, (w.max(h) - 1).max(1));
        }
    }
}

/// rectangle of size (sx, sy) centred at (x, y), rotated by `angle` degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRectangle {
    pub x: f32,
    pub y: f32,
    pub sx: f32,
    pub sy: f32,
    pub angle: f32,
}

impl RotatedRectangle {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        let mut r = RotatedRectangle {
            x: rng.random::<f32>() * width as f32,
            y: rng.random::<f32>() * height as f32,
            sx: rng.random_range(1..=32) as f32,
            sy: rng.random_range(1..=32) as f32,
            angle: rng.random_range(0..360) as f32,
        };
        if !r.is_valid() {
            r.mutate(rng, width, height);
        }
        r
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        for _ in 0..MAX_MUTATE_ATTEMPTS {
            match rng.random_range(0..3) {
                0 => {
                    self.x = (self.x + jitter(rng, STEP)).clamp(0.0, w - 1.0);
                    self.y = (self.y + jitter(rng, STEP)).clamp(0.0, h - 1.0);
                }
                1 => {
                    self.sx = (self.sx + jitter(rng, STEP)).clamp(1.0, w.max(2.0) - 1.0);
                    self.sy = (self.sy + jitter(rng, STEP)).clamp(1.0, h.max(2.0) - 1.0);
                }
                _ => self.angle = (self.angle + jitter(rng, ANGLE_STEP)).rem_euclid(360.0),
            }
            if self.is_valid() {
                return;
            }
        }
    }

    /// aspect ratio at most 5:1
    pub fn is_valid(&self) -> bool {
        let (a, b) = (self.sx.max(self.sy), self.sx.min(self.sy));
        b > 0.0 && a / b <= 5.0
    }

    pub fn corners(&self) -> [(f32, f32); 4] {
        let (hx, hy) = (self.sx * 0.5, self.sy * 0.5);
        [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)].map(|(px, py)| {
            let (rx, ry) = rotate(px, py, self.angle);
            (self.x + rx, self.y + ry)
        })
    }
}

/// quadratic bezier stroke from p1 to p3 with control point p2
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quadratic {
    pub p1: (f32, f32),
    pub p2: (f32, f32),
    pub p3: (f32, f32),
    pub width: f32,
}

impl Quadratic {
    const MIN_WIDTH: f32 = 1.0;
    const MAX_WIDTH: f32 = 16.0;

    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        let p1 = (rng.random::<f32>() * width as f32, rng.random::<f32>() * height as f32);
        let p2 = (p1.0 + jitter(rng, 20.0), p1.1 + jitter(rng, 20.0));
        let p3 = (p2.0 + jitter(rng, 20.0), p2.1 + jitter(rng, 20.0));
        let mut q = Quadratic { p1, p2, p3, width: Self::MIN_WIDTH };
        if !q.is_valid() {
            q.mutate(rng, width, height);
        }
        q
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        for _ in 0..MAX_MUTATE_ATTEMPTS {
            let choice = rng.random_range(0..4);
            if choice == 3 {
                self.width = (self.width + jitter(rng, 1.0)).clamp(Self::MIN_WIDTH, Self::MAX_WIDTH);
            } else {
                let p = match choice {
                    0 => &mut self.p1,
                    1 => &mut self.p2,
                    _ => &mut self.p3,
                };
                p.0 = (p.0 + jitter(rng, STEP)).clamp(-MARGIN, w - 1.0 + MARGIN);
                p.1 = (p.1 + jitter(rng, STEP)).clamp(-MARGIN, h - 1.0 + MARGIN);
            }
            if self.is_valid() {
                return;
            }
        }
    }

    /// the chord must be longer than either control arm, so the curve cannot fold back
    pub fn is_valid(&self) -> bool {
        fn d2(a: (f32, f32), b: (f32, f32)) -> f32 {
            (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
        }
        let d12 = d2(self.p1, self.p2);
        let d23 = d2(self.p2, self.p3);
        let d13 = d2(self.p1, self.p3);
        d13 > d12 && d13 > d23
    }

    /// centre line of the stroke
    pub fn path(&self) -> Option<sk::Path> {
        let mut pb = sk::PathBuilder::new();
        pb.move_to(self.p1.0, self.p1.1);
        pb.quad_to(self.p2.0, self.p2.1, self.p3.0, self.p3.1);
        pb.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedEllipse {
    pub x: f32,
    pub y: f32,
    pub rx: f32,
    pub ry: f32,
    pub angle: f32,
}

impl RotatedEllipse {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        RotatedEllipse {
            x: rng.random::<f32>() * width as f32,
            y: rng.random::<f32>() * height as f32,
            rx: rng.random::<f32>() * 32.0 + 1.0,
            ry: rng.random::<f32>() * 32.0 + 1.0,
            angle: rng.random::<f32>() * 360.0,
        }
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        match rng.random_range(0..3) {
            0 => {
                self.x = (self.x + jitter(rng, STEP)).clamp(0.0, w - 1.0);
                self.y = (self.y + jitter(rng, STEP)).clamp(0.0, h - 1.0);
            }
            1 => {
                self.rx = (self.rx + jitter(rng, STEP)).clamp(1.0, w.max(2.0) - 1.0);
                self.ry = (self.ry + jitter(rng, STEP)).clamp(1.0, h.max(2.0) - 1.0);
            }
            _ => self.angle = (self.angle + jitter(rng, ANGLE_STEP)).rem_euclid(360.0),
        }
    }

    pub fn path(&self) -> Option<sk::Path> {
        let oval = sk::Rect::from_xywh(-self.rx, -self.ry, 2.0 * self.rx, 2.0 * self.ry)?;
        let placement = sk::Transform::from_rotate(self.angle).post_translate(self.x, self.y);
        sk::PathBuilder::from_oval(oval)?.transform(placement)
    }
}

/// free-form quadrilateral, kept simple (no bow-ties) with non-zero area
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: [(f32, f32); POLYGON_ORDER],
}

impl Polygon {
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        let x = rng.random::<f32>() * width as f32;
        let y = rng.random::<f32>() * height as f32;
        let mut points = [(x, y); POLYGON_ORDER];
        for p in points.iter_mut().skip(1) {
            *p = (x + jitter(rng, 20.0), y + jitter(rng, 20.0));
        }
        let mut poly = Polygon { points };
        if !poly.is_valid() {
            poly.mutate(rng, width, height);
        }
        poly
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        for _ in 0..MAX_MUTATE_ATTEMPTS {
            if rng.random_bool(0.25) {
                let i = rng.random_range(0..POLYGON_ORDER);
                let j = rng.random_range(0..POLYGON_ORDER);
                self.points.swap(i, j);
            } else {
                let p = &mut self.points[rng.random_range(0..POLYGON_ORDER)];
                p.0 = (p.0 + jitter(rng, STEP)).clamp(-MARGIN, w - 1.0 + MARGIN);
                p.1 = (p.1 + jitter(rng, STEP)).clamp(-MARGIN, h - 1.0 + MARGIN);
            }
            if self.is_valid() {
                return;
            }
        }
    }

    /// simple and not collapsed onto a line
    pub fn is_valid(&self) -> bool {
        is_simple(&self.points) && signed_area(&self.points).abs() > 1.0
    }
}

/// one placed primitive
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Triangle(Triangle),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Circle(Circle),
    RotatedRectangle(RotatedRectangle),
    Quadratic(Quadratic),
    RotatedEllipse(RotatedEllipse),
    Polygon(Polygon),
}

impl Shape {
    /// build a random shape of the given kind inside a `width` x `height` canvas.
    /// `Any` is resolved through the same rng first.
    pub fn random<R: Rng + ?Sized>(kind: ShapeType, width: u32, height: u32, rng: &mut R) -> Shape {
        match kind.resolve(rng) {
            ShapeType::Triangle => Shape::Triangle(Triangle::random(width, height, rng)),
            ShapeType::Rectangle => Shape::Rectangle(Rectangle::random(width, height, rng)),
            ShapeType::Ellipse => Shape::Ellipse(Ellipse::random(width, height, rng)),
            ShapeType::Circle => Shape::Circle(Circle::random(width, height, rng)),
            ShapeType::RotatedRectangle => Shape::RotatedRectangle(RotatedRectangle::random(width, height, rng)),
            ShapeType::Quadratic => Shape::Quadratic(Quadratic::random(width, height, rng)),
            ShapeType::RotatedEllipse => Shape::RotatedEllipse(RotatedEllipse::random(width, height, rng)),
            ShapeType::Polygon | ShapeType::Any => Shape::Polygon(Polygon::random(width, height, rng)),
        }
    }

    pub fn kind(&self) -> ShapeType {
        match self {
            Shape::Triangle(_) => ShapeType::Triangle,
            Shape::Rectangle(_) => ShapeType::Rectangle,
            Shape::Ellipse(_) => ShapeType::Ellipse,
            Shape::Circle(_) => ShapeType::Circle,
            Shape::RotatedRectangle(_) => ShapeType::RotatedRectangle,
            Shape::Quadratic(_) => ShapeType::Quadratic,
            Shape::RotatedEllipse(_) => ShapeType::RotatedEllipse,
            Shape::Polygon(_) => ShapeType::Polygon,
        }
    }

    /// apply one random local change, keeping the shape valid
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) {
        match self {
            Shape::Triangle(s) => s.mutate(rng, width, height),
            Shape::Rectangle(s) => s.mutate(rng, width, height),
            Shape::Ellipse(s) => s.mutate(rng, width, height),
            Shape::Circle(s) => s.mutate(rng, width, height),
            Shape::RotatedRectangle(s) => s.mutate(rng, width, height),
            Shape::Quadratic(s) => s.mutate(rng, width, height),
            Shape::RotatedEllipse(s) => s.mutate(rng, width, height),
            Shape::Polygon(s) => s.mutate(rng, width, height),
        }
    }

    /// Vector outline in canvas coordinates, as drawn by the renderer. For
    /// `Quadratic` this is the centre line, to be stroked with its width.
    /// Integer shapes cover whole pixels, so their outlines sit on pixel edges.
    pub fn path(&self) -> Option<sk::Path> {
        match self {
            Shape::Triangle(t) => polygon_path(&t.points),
            Shape::Rectangle(r) => {
                let (x1, y1, x2, y2) = r.bounds();
                let rect = sk::Rect::from_ltrb(x1 as f32, y1 as f32, (x2 + 1) as f32, (y2 + 1) as f32)?;
                Some(sk::PathBuilder::from_rect(rect))
            }
            Shape::Ellipse(e) => pixel_oval(e.x, e.y, e.rx, e.ry),
            Shape::Circle(c) => pixel_oval(c.x, c.y, c.r, c.r),
            Shape::RotatedRectangle(r) => polygon_path(&r.corners()),
            Shape::Quadratic(q) => q.path(),
            Shape::RotatedEllipse(e) => e.path(),
            Shape::Polygon(p) => polygon_path(&p.points),
        }
    }

    /// replace the contents of `lines` with this shape's coverage at the rasterizer's resolution
    pub fn rasterize(&self, rasterizer: &mut Rasterizer, lines: &mut Vec<Scanline>) {
        profiling::scope!("Shape::rasterize");
        lines.clear();
        let (w, h) = (rasterizer.width(), rasterizer.height());
        match self {
            Shape::Triangle(t) => rasterizer.fill_polygon(&t.points, lines),
            Shape::Rectangle(r) => {
                let (x1, y1, x2, y2) = r.bounds();
                for y in y1..=y2 {
                    if let Some(line) = Scanline::clipped(y, x1, x2, w, h) {
                        lines.push(line);
                    }
                }
            }
            Shape::Ellipse(e) => ellipse_lines(e.x, e.y, e.rx, e.ry, w, h, lines),
            Shape::Circle(c) => ellipse_lines(c.x, c.y, c.r, c.r, w, h, lines),
            Shape::RotatedRectangle(r) => rasterizer.fill_polygon(&r.corners(), lines),
            Shape::Quadratic(q) => {
                if let Some(path) = q.path() {
                    rasterizer.stroke_path(&path, q.width, lines);
                }
            }
            Shape::RotatedEllipse(e) => {
                if let Some(path) = e.path() {
                    rasterizer.fill_path(&path, lines);
                }
            }
            Shape::Polygon(p) => rasterizer.fill_polygon(&p.points, lines),
        }
    }
}

// oval around a pixel centre
fn pixel_oval(x: i32, y: i32, rx: i32, ry: i32) -> Option<sk::Path> {
    let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
    let rect = sk::Rect::from_xywh(cx - rx as f32, cy - ry as f32, 2.0 * rx as f32, 2.0 * ry as f32)?;
    sk::PathBuilder::from_oval(rect)
}

fn ellipse_lines(cx: i32, cy: i32, rx: i32, ry: i32, width: u32, height: u32, lines: &mut Vec<Scanline>) {
    let aspect = rx as f32 / ry as f32;
    for dy in (1 - ry)..ry {
        let s = (((ry * ry - dy * dy) as f32).sqrt() * aspect) as i32;
        if let Some(line) = Scanline::clipped(cy + dy, cx - s, cx + s, width, height) {
            lines.push(line);
        }
    }
}
