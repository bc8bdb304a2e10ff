use crate::{
    effects::blur::blur_surface,
    foundation::error::MosaiqResult,
    render::surface::Surface,
    scene::model::FilterSettings,
};

/// 4x5 color matrix in row-major `[r g b a offset]` rows, applied to
/// unpremultiplied channels.
pub(crate) type ColorMatrix = [f32; 20];

pub(crate) const IDENTITY_MATRIX: ColorMatrix = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

// Rec. 709 luma weights used by the CSS filter primitives.
const LR: f32 = 0.2126;
const LG: f32 = 0.7152;
const LB: f32 = 0.0722;

/// A compiled filter chain: brightness -> contrast -> saturate fold into one
/// matrix, blur runs as a spatial pass, hue-rotate -> grayscale -> sepia ->
/// invert fold into a second matrix. The split preserves the fixed chain
/// order around the non-linear blur stage.
#[derive(Clone, Debug)]
pub(crate) struct FilterChain {
    pre: Option<ColorMatrix>,
    blur_radius: u32,
    post: Option<ColorMatrix>,
}

impl FilterChain {
    pub(crate) fn compile(settings: &FilterSettings) -> Self {
        let mut pre = IDENTITY_MATRIX;
        let mut pre_used = false;
        for (value, build) in [
            (settings.brightness, brightness_matrix as fn(f32) -> ColorMatrix),
            (settings.contrast, contrast_matrix),
            (settings.saturation, saturate_matrix),
        ] {
            if (value - 100.0).abs() > f64::EPSILON {
                pre = compose(build((value / 100.0) as f32), pre);
                pre_used = true;
            }
        }

        let mut post = IDENTITY_MATRIX;
        let mut post_used = false;
        if settings.hue_rotate_deg.rem_euclid(360.0) > f64::EPSILON {
            post = compose(hue_rotate_matrix(settings.hue_rotate_deg as f32), post);
            post_used = true;
        }
        for (value, build) in [
            (settings.grayscale, grayscale_matrix as fn(f32) -> ColorMatrix),
            (settings.sepia, sepia_matrix),
            (settings.invert, invert_matrix),
        ] {
            if value > f64::EPSILON {
                post = compose(build((value / 100.0) as f32), post);
                post_used = true;
            }
        }

        Self {
            pre: pre_used.then_some(pre),
            blur_radius: settings.blur_px.clamp(0.0, 20.0).round() as u32,
            post: post_used.then_some(post),
        }
    }

    pub(crate) fn is_neutral(&self) -> bool {
        self.pre.is_none() && self.post.is_none() && self.blur_radius == 0
    }

    pub(crate) fn apply(&self, surface: &mut Surface) -> MosaiqResult<()> {
        if let Some(m) = self.pre {
            apply_color_matrix(surface, m);
        }
        if self.blur_radius > 0 {
            *surface = blur_surface(surface, self.blur_radius)?;
        }
        if let Some(m) = self.post {
            apply_color_matrix(surface, m);
        }
        Ok(())
    }
}

/// Apply a color matrix in-place. Channels are unpremultiplied for the
/// matrix and re-premultiplied afterwards; alpha rides through row 4.
pub(crate) fn apply_color_matrix(surface: &mut Surface, m: ColorMatrix) {
    for px in surface.data_mut().chunks_exact_mut(4) {
        let pr = px[0] as f32 / 255.0;
        let pg = px[1] as f32 / 255.0;
        let pb = px[2] as f32 / 255.0;
        let pa = px[3] as f32 / 255.0;

        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = pr * inv_a;
        let g = pg * inv_a;
        let b = pb * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        px[0] = ((out_r * out_a).clamp(0.0, 1.0) * 255.0).round() as u8;
        px[1] = ((out_g * out_a).clamp(0.0, 1.0) * 255.0).round() as u8;
        px[2] = ((out_b * out_a).clamp(0.0, 1.0) * 255.0).round() as u8;
        px[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// `second ∘ first`: the returned matrix applies `first`, then `second`.
pub(crate) fn compose(second: ColorMatrix, first: ColorMatrix) -> ColorMatrix {
    let mut out = [0.0f32; 20];
    for row in 0..4 {
        for col in 0..4 {
            let mut acc = 0.0;
            for k in 0..4 {
                acc += second[row * 5 + k] * first[k * 5 + col];
            }
            out[row * 5 + col] = acc;
        }
        let mut offset = second[row * 5 + 4];
        for k in 0..4 {
            offset += second[row * 5 + k] * first[k * 5 + 4];
        }
        out[row * 5 + 4] = offset;
    }
    out
}

fn brightness_matrix(v: f32) -> ColorMatrix {
    let mut m = IDENTITY_MATRIX;
    m[0] = v;
    m[6] = v;
    m[12] = v;
    m
}

fn contrast_matrix(v: f32) -> ColorMatrix {
    let offset = 0.5 * (1.0 - v);
    let mut m = IDENTITY_MATRIX;
    m[0] = v;
    m[4] = offset;
    m[6] = v;
    m[9] = offset;
    m[12] = v;
    m[14] = offset;
    m
}

fn saturate_matrix(v: f32) -> ColorMatrix {
    [
        LR + (1.0 - LR) * v,
        LG - LG * v,
        LB - LB * v,
        0.0,
        0.0,
        LR - LR * v,
        LG + (1.0 - LG) * v,
        LB - LB * v,
        0.0,
        0.0,
        LR - LR * v,
        LG - LG * v,
        LB + (1.0 - LB) * v,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

fn grayscale_matrix(amount: f32) -> ColorMatrix {
    // grayscale(a) == saturate(1 - a)
    saturate_matrix(1.0 - amount.clamp(0.0, 1.0))
}

fn sepia_matrix(amount: f32) -> ColorMatrix {
    let a = amount.clamp(0.0, 1.0);
    let mix = |from: f32, to: f32| from + (to - from) * a;
    [
        mix(1.0, 0.393),
        mix(0.0, 0.769),
        mix(0.0, 0.189),
        0.0,
        0.0,
        mix(0.0, 0.349),
        mix(1.0, 0.686),
        mix(0.0, 0.168),
        0.0,
        0.0,
        mix(0.0, 0.272),
        mix(0.0, 0.534),
        mix(1.0, 0.131),
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

pub(crate) fn invert_matrix(amount: f32) -> ColorMatrix {
    let a = amount.clamp(0.0, 1.0);
    let scale = 1.0 - 2.0 * a;
    let mut m = IDENTITY_MATRIX;
    m[0] = scale;
    m[4] = a;
    m[6] = scale;
    m[9] = a;
    m[12] = scale;
    m[14] = a;
    m
}

pub(crate) fn hue_rotate_matrix(deg: f32) -> ColorMatrix {
    let rad = deg.to_radians();
    let cos = rad.cos();
    let sin = rad.sin();
    [
        0.213 + cos * 0.787 - sin * 0.213,
        0.715 - cos * 0.715 - sin * 0.715,
        0.072 - cos * 0.072 + sin * 0.928,
        0.0,
        0.0,
        0.213 - cos * 0.213 + sin * 0.143,
        0.715 + cos * 0.285 + sin * 0.140,
        0.072 - cos * 0.072 - sin * 0.283,
        0.0,
        0.0,
        0.213 - cos * 0.213 - sin * 0.787,
        0.715 - cos * 0.715 + sin * 0.715,
        0.072 + cos * 0.928 + sin * 0.072,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_surface(px: [u8; 4]) -> Surface {
        let mut s = Surface::new(2, 2).unwrap();
        for chunk in s.data_mut().chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        s
    }

    #[test]
    fn neutral_settings_compile_to_noop() {
        let chain = FilterChain::compile(&FilterSettings::default());
        assert!(chain.is_neutral());

        let mut s = opaque_surface([12, 200, 90, 255]);
        let before = s.clone();
        chain.apply(&mut s).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn brightness_scales_channels() {
        let chain = FilterChain::compile(&FilterSettings {
            brightness: 200.0,
            ..FilterSettings::default()
        });
        let mut s = opaque_surface([40, 60, 80, 255]);
        chain.apply(&mut s).unwrap();
        assert_eq!(&s.data()[0..4], &[80, 120, 160, 255]);
    }

    #[test]
    fn full_invert_flips_channels() {
        let chain = FilterChain::compile(&FilterSettings {
            invert: 100.0,
            ..FilterSettings::default()
        });
        let mut s = opaque_surface([255, 0, 30, 255]);
        chain.apply(&mut s).unwrap();
        assert_eq!(&s.data()[0..4], &[0, 255, 225, 255]);
    }

    #[test]
    fn full_grayscale_equalizes_channels() {
        let chain = FilterChain::compile(&FilterSettings {
            grayscale: 100.0,
            ..FilterSettings::default()
        });
        let mut s = opaque_surface([255, 0, 0, 255]);
        chain.apply(&mut s).unwrap();
        let px = &s.data()[0..4];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        // Red maps to its Rec. 709 luma.
        assert!((i32::from(px[0]) - 54).abs() <= 1);
    }

    #[test]
    fn chain_order_is_brightness_then_contrast() {
        // brightness(2.0) then contrast(0.5) differs from the reverse; the
        // compiled chain must match the documented order.
        let m = compose(contrast_matrix(0.5), brightness_matrix(2.0));
        // x -> 2x -> (2x - 0.5)*0.5 + 0.5 = x + 0.25
        let x = 0.25f32;
        let applied = m[0] * x + m[4];
        assert!((applied - (x + 0.25)).abs() < 1e-6);
    }

    #[test]
    fn hue_rotate_360_is_identity() {
        let m = hue_rotate_matrix(360.0);
        for (a, b) in m.iter().zip(IDENTITY_MATRIX.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }
}
