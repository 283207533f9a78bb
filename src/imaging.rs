//! Pixel sampling helpers shared by OCR extraction and raster output.

use std::collections::BTreeMap;

use image::RgbImage;

use crate::model::{BoundingBox, Color};

/// Width of the ring sampled around a box for its background.
const BORDER_RING: u32 = 2;

/// Integer pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    /// Round a box outward to whole pixels, clipped to the image.
    pub fn covering(bbox: &BoundingBox, width: u32, height: u32) -> Option<Self> {
        let x0 = bbox.x.floor().max(0.0) as u32;
        let y0 = bbox.y.floor().max(0.0) as u32;
        let x1 = (bbox.right().ceil().max(0.0) as u32).min(width);
        let y1 = (bbox.bottom().ceil().max(0.0) as u32).min(height);
        (x0 < x1 && y0 < y1).then_some(Self { x0, y0, x1, y1 })
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    fn grow(&self, by: u32, width: u32, height: u32) -> Self {
        Self {
            x0: self.x0.saturating_sub(by),
            y0: self.y0.saturating_sub(by),
            x1: (self.x1 + by).min(width),
            y1: (self.y1 + by).min(height),
        }
    }
}

/// Most frequent color around `rect`, with channels bucketed to 16 levels.
///
/// Samples a thin ring outside the rectangle; where the rectangle touches
/// the image edge, the rectangle's own edge pixels stand in.
pub(crate) fn border_color(img: &RgbImage, rect: PixelRect) -> Color {
    let ring = rect.grow(BORDER_RING, img.width(), img.height());
    let mut buckets: BTreeMap<(u8, u8, u8), (u32, [u64; 3])> = BTreeMap::new();

    for y in ring.y0..ring.y1 {
        for x in ring.x0..ring.x1 {
            let outside = x < rect.x0 || y < rect.y0 || x >= rect.x1 || y >= rect.y1;
            if !outside && !touches(rect, ring, x, y) {
                continue;
            }
            let p = img.get_pixel(x, y).0;
            let entry = buckets
                .entry((p[0] >> 4, p[1] >> 4, p[2] >> 4))
                .or_insert((0, [0; 3]));
            entry.0 += 1;
            for c in 0..3 {
                entry.1[c] += p[c] as u64;
            }
        }
    }

    buckets
        .values()
        .max_by_key(|(count, _)| *count)
        .map(|(count, sum)| {
            let n = *count as u64;
            Color::new((sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8)
        })
        .unwrap_or(Color::WHITE)
}

/// Edge pixels of `rect` on sides where the ring could not grow.
fn touches(rect: PixelRect, ring: PixelRect, x: u32, y: u32) -> bool {
    (ring.x0 == rect.x0 && x == rect.x0)
        || (ring.y0 == rect.y0 && y == rect.y0)
        || (ring.x1 == rect.x1 && x + 1 == rect.x1)
        || (ring.y1 == rect.y1 && y + 1 == rect.y1)
}

/// The pixel in `rect` farthest from `background`; black when nothing stands out.
pub(crate) fn contrast_color(img: &RgbImage, rect: PixelRect, background: Color) -> Color {
    let mut best = (0u32, Color::BLACK);
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let p = img.get_pixel(x, y).0;
            let d = distance(Color::new(p[0], p[1], p[2]), background);
            if d > best.0 {
                best = (d, Color::new(p[0], p[1], p[2]));
            }
        }
    }
    best.1
}

/// Squared RGB distance.
pub(crate) fn distance(a: Color, b: Color) -> u32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    (dr * dr + dg * dg + db * db) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn canvas(bg: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(40, 20, Rgb(bg))
    }

    #[test]
    fn test_covering_rounds_outward_and_clips() {
        let rect = PixelRect::covering(&BoundingBox::new(1.5, 2.2, 3.0, 4.0), 40, 20).unwrap();
        assert_eq!(rect, PixelRect { x0: 1, y0: 2, x1: 5, y1: 7 });

        let rect = PixelRect::covering(&BoundingBox::new(35.0, 15.0, 20.0, 20.0), 40, 20).unwrap();
        assert_eq!((rect.x1, rect.y1), (40, 20));

        assert!(PixelRect::covering(&BoundingBox::new(50.0, 0.0, 5.0, 5.0), 40, 20).is_none());
    }

    #[test]
    fn test_border_color_ignores_box_interior() {
        let mut img = canvas([240, 240, 200]);
        for y in 5..15 {
            for x in 10..30 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let rect = PixelRect { x0: 10, y0: 5, x1: 30, y1: 15 };
        assert_eq!(border_color(&img, rect), Color::new(240, 240, 200));
    }

    #[test]
    fn test_border_color_at_image_edge() {
        let img = canvas([10, 20, 30]);
        let rect = PixelRect { x0: 0, y0: 0, x1: 40, y1: 20 };
        assert_eq!(border_color(&img, rect), Color::new(10, 20, 30));
    }

    #[test]
    fn test_contrast_color() {
        let mut img = canvas([255, 255, 255]);
        img.put_pixel(12, 8, Rgb([200, 0, 0]));
        let rect = PixelRect { x0: 10, y0: 5, x1: 30, y1: 15 };
        assert_eq!(contrast_color(&img, rect, Color::WHITE), Color::new(200, 0, 0));

        let plain = canvas([255, 255, 255]);
        assert_eq!(contrast_color(&plain, rect, Color::WHITE), Color::BLACK);
    }
}
