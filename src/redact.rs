use crate::bbox::{BBox, Ltrb};
use crate::config::{RedactConfig, RedactMode};
use crate::error::Result;
use image::{imageops, Rgb, RgbImage};

/// Hides everything in a frame outside one region
#[derive(Debug, Clone)]
pub struct Redactor {
    config: RedactConfig,
}

/// Pixel rectangle `[x0, x1) x [y0, y1)` kept intact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

impl Redactor {
    pub fn new(config: RedactConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &RedactConfig {
        &self.config
    }

    /// The kept region for `bbox` in a `width` x `height` frame.
    ///
    /// Every side moves outward by `expansion` of the box extent only if it
    /// stays inside the frame, then the result is clamped to the frame.
    pub fn region(&self, bbox: &BBox<Ltrb>, width: u32, height: u32) -> Region {
        let (fw, fh) = (width as f32, height as f32);
        let e = self.config.expansion;
        let (dw, dh) = (bbox.width() * e, bbox.height() * e);

        let mut left = bbox.left();
        let mut top = bbox.top();
        let mut right = bbox.right();
        let mut bottom = bbox.bottom();

        if left - dw >= 0.0 {
            left -= dw;
        }
        if top - dh >= 0.0 {
            top -= dh;
        }
        if right + dw <= fw {
            right += dw;
        }
        if bottom + dh <= fh {
            bottom += dh;
        }

        let clamp = |v: f32, max: f32| v.max(0.0).min(max) as u32;

        let x0 = clamp(left.floor(), fw);
        let y0 = clamp(top.floor(), fh);

        Region {
            x0,
            y0,
            x1: clamp(right.ceil(), fw).max(x0),
            y1: clamp(bottom.ceil(), fh).max(y0),
        }
    }

    /// Redacts `frame` in place outside the (expanded) `bbox`
    pub fn redact(&self, frame: &mut RgbImage, bbox: &BBox<Ltrb>) {
        let region = self.region(bbox, frame.width(), frame.height());

        match self.config.mode {
            RedactMode::Blur { sigma } => {
                let blurred = imageops::blur(&*frame, sigma);

                for (x, y, px) in frame.enumerate_pixels_mut() {
                    if !region.contains(x, y) {
                        *px = *blurred.get_pixel(x, y);
                    }
                }
            }
            RedactMode::Mask => {
                for (x, y, px) in frame.enumerate_pixels_mut() {
                    if !region.contains(x, y) {
                        *px = Rgb([0, 0, 0]);
                    }
                }
            }
        }
    }
}
