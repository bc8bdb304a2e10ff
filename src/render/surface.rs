use crate::{
    assets::decode::PreparedImage,
    foundation::core::Rgba8Premul,
    foundation::error::{MosaiqError, MosaiqResult},
    foundation::math::{add_sat_u8, mul_div255_u8},
    scene::model::BlendMode,
};

/// A CPU raster surface in row-major premultiplied RGBA8.
///
/// Surfaces are the only pixel container in the engine: scratch layers,
/// effect buffers and the final frame are all `Surface` values. A surface
/// never outlives the pipeline stage that created it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> MosaiqResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| MosaiqError::render("surface size overflow"))?;
        if width == 0 || height == 0 {
            return Err(MosaiqError::render("surface dimensions must be > 0"));
        }
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Surface of the given size filled with `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> MosaiqResult<Self> {
        let mut s = Self::new(width, height)?;
        s.fill(color);
        Ok(s)
    }

    /// Copy a decoded image into a surface.
    pub fn from_image(image: &PreparedImage) -> MosaiqResult<Self> {
        let mut s = Self::new(image.width, image.height)?;
        s.data.copy_from_slice(&image.rgba8_premul);
        Ok(s)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable premultiplied RGBA8 bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Fill the whole surface with `color`.
    pub fn fill(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Pixel at `(x, y)`; transparent outside the surface.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> [u8; 4] {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Overwrite the pixel at `(x, y)`; out-of-bounds writes are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, px: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[idx..idx + 4].copy_from_slice(&px);
    }

    /// Source-over a single pixel at `(x, y)`.
    #[inline]
    pub fn over_pixel(&mut self, x: i32, y: i32, src: [u8; 4]) {
        if src[3] == 0 {
            return;
        }
        let dst = self.pixel(x, y);
        self.set_pixel(x, y, premul_over_px(dst, src));
    }

    /// Bilinear sample at a fractional position; edges clamp-to-transparent.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> [u8; 4] {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as i32;
        let y0 = y0 as i32;

        let p00 = self.pixel(x0, y0);
        let p10 = self.pixel(x0 + 1, y0);
        let p01 = self.pixel(x0, y0 + 1);
        let p11 = self.pixel(x0 + 1, y0 + 1);

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
            let bot = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
            out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Convert to straight-alpha RGBA8 (e.g. for PNG encoding).
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            for c in 0..3 {
                px[c] = ((u16::from(px[c]) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Porter-Duff source-over of two premultiplied pixels. In premultiplied
/// form the same `src + dst * (1 - src_a)` law covers all four channels.
#[inline]
pub(crate) fn premul_over_px(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);
    std::array::from_fn(|c| add_sat_u8(src[c], mul_div255_u8(u16::from(dst[c]), inv)))
}

/// Linear mix of two premultiplied pixels, `t = 0` -> `a`, `t = 1` -> `b`.
#[inline]
pub(crate) fn crossfade_px(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let av = mul_div255_u8(u16::from(a[c]), it);
        let bv = mul_div255_u8(u16::from(b[c]), tt);
        out[c] = add_sat_u8(av, bv);
    }
    out
}

/// Scale a premultiplied pixel by an opacity factor.
#[inline]
pub(crate) fn scale_px(px: [u8; 4], opacity: f32) -> [u8; 4] {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    [
        mul_div255_u8(u16::from(px[0]), op),
        mul_div255_u8(u16::from(px[1]), op),
        mul_div255_u8(u16::from(px[2]), op),
        mul_div255_u8(u16::from(px[3]), op),
    ]
}

/// Composite a premultiplied source pixel over a destination pixel with a
/// blend mode and opacity. `Normal` takes the integer fast path; the other
/// modes run Porter-Duff with the blend applied to unpremultiplied channels:
/// `out_p = sp*(1-da) + dp*(1-sa) + B(sc, dc)*sa*da`.
#[inline]
pub(crate) fn blend_src_over_px(
    dst: [u8; 4],
    src: [u8; 4],
    opacity: f32,
    mode: BlendMode,
) -> [u8; 4] {
    if let BlendMode::Normal = mode {
        return premul_over_px(dst, scale_px(src, opacity));
    }
    blend_px_with(dst, src, opacity, |s, d| blend_channel(mode, s, d))
}

#[inline(always)]
fn blend_px_with<F>(d: [u8; 4], s: [u8; 4], opacity: f32, blend_fn: F) -> [u8; 4]
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return d;
    }

    let sp_r = (s[0] as f32 / 255.0) * opacity;
    let sp_g = (s[1] as f32 / 255.0) * opacity;
    let sp_b = (s[2] as f32 / 255.0) * opacity;
    let sa = (s[3] as f32 / 255.0) * opacity;

    let dp_r = d[0] as f32 / 255.0;
    let dp_g = d[1] as f32 / 255.0;
    let dp_b = d[2] as f32 / 255.0;
    let da = d[3] as f32 / 255.0;

    let inv_sa = 1.0 - sa;
    let out_a = (sa + da * inv_sa).clamp(0.0, 1.0);

    let unpre = |p: f32, a: f32| if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 };
    let sc_r = unpre(sp_r, sa);
    let sc_g = unpre(sp_g, sa);
    let sc_b = unpre(sp_b, sa);
    let dc_r = unpre(dp_r, da);
    let dc_g = unpre(dp_g, da);
    let dc_b = unpre(dp_b, da);

    let b_r = blend_fn(sc_r, dc_r).clamp(0.0, 1.0);
    let b_g = blend_fn(sc_g, dc_g).clamp(0.0, 1.0);
    let b_b = blend_fn(sc_b, dc_b).clamp(0.0, 1.0);

    let out_p_r = (sp_r * (1.0 - da) + dp_r * (1.0 - sa) + b_r * sa * da).clamp(0.0, 1.0);
    let out_p_g = (sp_g * (1.0 - da) + dp_g * (1.0 - sa) + b_g * sa * da).clamp(0.0, 1.0);
    let out_p_b = (sp_b * (1.0 - da) + dp_b * (1.0 - sa) + b_b * sa * da).clamp(0.0, 1.0);

    [
        (out_p_r * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_p_g * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_p_b * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Separable blend function on unpremultiplied channels (W3C compositing
/// definitions).
#[inline(always)]
fn blend_channel(mode: BlendMode, s: f32, d: f32) -> f32 {
    match mode {
        BlendMode::Normal => s,
        BlendMode::Multiply => s * d,
        BlendMode::Screen => s + d - s * d,
        BlendMode::Overlay => {
            if d <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }
        BlendMode::Darken => s.min(d),
        BlendMode::Lighten => s.max(d),
        BlendMode::SoftLight => {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }
        BlendMode::HardLight => {
            if s <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }
        BlendMode::Difference => (d - s).abs(),
        BlendMode::Exclusion => d + s - 2.0 * d * s,
    }
}

/// Source-over `src` onto `dst` with opacity and blend mode. Buffers must
/// have identical dimensions.
pub fn composite_over(
    dst: &mut Surface,
    src: &Surface,
    opacity: f32,
    blend: BlendMode,
) -> MosaiqResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(MosaiqError::render(
            "composite_over expects equal-size surfaces",
        ));
    }

    // Blend-mode dispatch is chosen once per op, not per pixel.
    match blend {
        BlendMode::Normal => {
            let opacity = opacity.clamp(0.0, 1.0);
            if opacity <= 0.0 {
                return Ok(());
            }
            let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
            for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
                let sa = mul_div255_u8(u16::from(s[3]), op);
                if sa == 0 {
                    continue;
                }
                let inv = 255u16 - u16::from(sa);
                d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
                for c in 0..3 {
                    let sc = mul_div255_u8(u16::from(s[c]), op);
                    let dc = mul_div255_u8(u16::from(d[c]), inv);
                    d[c] = add_sat_u8(sc, dc);
                }
            }
            Ok(())
        }
        mode => {
            for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
                let out = blend_px_with(
                    [d[0], d[1], d[2], d[3]],
                    [s[0], s[1], s[2], s[3]],
                    opacity,
                    |sc, dc| blend_channel(mode, sc, dc),
                );
                d.copy_from_slice(&out);
            }
            Ok(())
        }
    }
}
