use crate::{render::surface::Surface, scene::model::DuotoneFx};

/// Remap every pixel's luminance onto a shadow->highlight color ramp.
///
/// Luminance uses the Rec. 601 weights, contrast reshapes the ramp input,
/// and `intensity` mixes the result against the original. Alpha is never
/// touched; `intensity == 0` leaves the surface bit-identical.
pub fn apply_duotone(surface: &mut Surface, fx: &DuotoneFx) {
    let intensity = (fx.intensity.clamp(0.0, 100.0) / 100.0) as f32;
    if intensity <= 0.0 {
        return;
    }
    let contrast_factor = ((fx.contrast.clamp(0.0, 100.0) / 100.0 - 0.5) * 2.0 + 1.0) as f32;
    let shadow = fx.shadow_color.to_rgba8_straight();
    let highlight = fx.highlight_color.to_rgba8_straight();

    for px in surface.data_mut().chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 {
            continue;
        }
        let af = f32::from(a) / 255.0;

        // Unpremultiply for the luminance math.
        let r = f32::from(px[0]) / af;
        let g = f32::from(px[1]) / af;
        let b = f32::from(px[2]) / af;

        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let adjusted = (((luma / 255.0 - 0.5) * contrast_factor + 0.5) * 255.0).clamp(0.0, 255.0);
        let t = adjusted / 255.0;

        for (c, chan) in px.iter_mut().take(3).enumerate() {
            let original = f32::from(*chan) / af;
            let target = f32::from(shadow[c]) + (f32::from(highlight[c]) - f32::from(shadow[c])) * t;
            let mixed = original + (target - original) * intensity;
            // Re-premultiply.
            *chan = (mixed.clamp(0.0, 255.0) * af).round().clamp(0.0, 255.0) as u8;
        }
    }
}
