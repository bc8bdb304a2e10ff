use crate::foundation::error::{MosaiqError, MosaiqResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Construct a canvas, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> MosaiqResult<Self> {
        if width == 0 || height == 0 {
            return Err(MosaiqError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Shorter canvas edge in pixels.
    pub fn min_dim(self) -> f64 {
        f64::from(self.width.min(self.height))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Scale `inner` to fit inside `outer` preserving aspect ratio, centered.
pub fn aspect_fit(inner_w: f64, inner_h: f64, outer: Rect) -> Rect {
    if inner_w <= 0.0 || inner_h <= 0.0 || outer.width() <= 0.0 || outer.height() <= 0.0 {
        return Rect::new(outer.x0, outer.y0, outer.x0, outer.y0);
    }
    let scale = (outer.width() / inner_w).min(outer.height() / inner_h);
    let w = inner_w * scale;
    let h = inner_h * scale;
    let x = outer.x0 + (outer.width() - w) / 2.0;
    let y = outer.y0 + (outer.height() - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Scale `inner` to cover `outer` preserving aspect ratio, centered (overflow
/// is cropped by the caller's clip).
pub fn aspect_fill(inner_w: f64, inner_h: f64, outer: Rect) -> Rect {
    if inner_w <= 0.0 || inner_h <= 0.0 || outer.width() <= 0.0 || outer.height() <= 0.0 {
        return Rect::new(outer.x0, outer.y0, outer.x0, outer.y0);
    }
    let scale = (outer.width() / inner_w).max(outer.height() / inner_h);
    let w = inner_w * scale;
    let h = inner_h * scale;
    let x = outer.x0 + (outer.width() - w) / 2.0;
    let y = outer.y0 + (outer.height() - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}
