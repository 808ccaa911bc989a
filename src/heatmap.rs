use crate::scanline::Scanline;

/// per-pixel hit counter over the canvas.
/// the worker only clears it at the start of each round; recording is available
/// for diagnostics but the search does not feed it.
#[derive(Clone, Debug)]
pub struct Heatmap {
    width: u32,
    height: u32,
    counts: Vec<u64>,
}

impl Heatmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counts: vec![0; (width as usize) * (height as usize)],
        }
    }

    pub fn clear(&mut self) {
        self.counts.fill(0);
    }

    /// add one hit for every pixel under `lines`
    pub fn add(&mut self, lines: &[Scanline]) {
        for line in lines {
            let row = line.y as usize * self.width as usize;
            for c in &mut self.counts[row + line.x1 as usize..=row + line.x2 as usize] {
                *c += 1;
            }
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u64 {
        self.counts[y as usize * self.width as usize + x as usize]
    }

    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_clear() {
        let mut h = Heatmap::new(4, 3);
        h.add(&[Scanline::new(1, 0, 2), Scanline::new(2, 3, 3)]);
        h.add(&[Scanline::new(1, 1, 1)]);
        assert_eq!(h.get(0, 1), 1);
        assert_eq!(h.get(1, 1), 2);
        assert_eq!(h.get(3, 2), 1);
        assert_eq!(h.get(3, 1), 0);
        assert_eq!(h.max(), 2);

        h.clear();
        assert_eq!(h.max(), 0);
        assert_eq!(h.dimensions(), (4, 3));
    }
}
