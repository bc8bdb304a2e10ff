use crate::{
    foundation::error::MosaiqResult,
    foundation::math::{hash_px, mul_div255_u8},
    render::filters::{apply_color_matrix, hue_rotate_matrix},
    render::surface::Surface,
    scene::model::GlitchFx,
};

/// Apply the enabled glitch sub-passes in a fixed order: channel split ->
/// block displacement -> scanlines -> noise -> hue shift.
///
/// Every pseudo-random decision derives from the scene seed through FNV-1a,
/// so the output is reproducible for a given scene.
pub fn apply_glitch(surface: &mut Surface, fx: &GlitchFx, seed: u64) -> MosaiqResult<()> {
    if let Some(split) = &fx.channel_split {
        channel_split(surface, split.shift_px)?;
    }
    if let Some(disp) = &fx.displacement {
        displacement(surface, disp.block_height_px, disp.max_shift_px, seed)?;
    }
    if let Some(lines) = &fx.scanlines {
        scanlines(surface, lines.spacing_px, lines.intensity);
    }
    if let Some(noise) = &fx.noise {
        add_noise(surface, noise.amount, seed);
    }
    if let Some(hue) = &fx.hue_shift {
        apply_color_matrix(surface, hue_rotate_matrix(hue.degrees as f32));
    }
    Ok(())
}

/// Red samples from the left, blue from the right; green and alpha stay.
fn channel_split(surface: &mut Surface, shift_px: f64) -> MosaiqResult<()> {
    let shift = shift_px.round() as i32;
    if shift == 0 {
        return Ok(());
    }
    let src = surface.clone();
    let (w, h) = (surface.width() as i32, surface.height() as i32);
    for y in 0..h {
        for x in 0..w {
            let base = src.pixel(x, y);
            let r = src.pixel(x + shift, y)[0];
            let b = src.pixel(x - shift, y)[2];
            surface.set_pixel(x, y, [r, base[1], b, base[3]]);
        }
    }
    Ok(())
}

/// Shift horizontal bands by a seeded per-band amount, wrapping around.
fn displacement(
    surface: &mut Surface,
    block_height_px: u32,
    max_shift_px: f64,
    seed: u64,
) -> MosaiqResult<()> {
    let block = block_height_px.max(1);
    let src = surface.clone();
    let (w, h) = (surface.width(), surface.height());
    for y in 0..h {
        let band = y / block;
        let r = hash_px(seed, band, 0x9e37) % 2001;
        let shift = ((r as f64 / 1000.0) - 1.0) * max_shift_px;
        let shift = shift.round() as i64;
        for x in 0..w {
            let sx = (i64::from(x) - shift).rem_euclid(i64::from(w)) as i32;
            surface.set_pixel(x as i32, y as i32, src.pixel(sx, y as i32));
        }
    }
    Ok(())
}

/// Darken every `spacing`-th row by `intensity`; alpha is preserved.
fn scanlines(surface: &mut Surface, spacing: u32, intensity: f64) {
    let spacing = spacing.max(1);
    let keep = ((1.0 - intensity.clamp(0.0, 1.0)) * 255.0).round() as u16;
    let (w, h) = (surface.width(), surface.height());
    for y in (0..h).step_by(spacing as usize) {
        for x in 0..w {
            let px = surface.pixel(x as i32, y as i32);
            surface.set_pixel(
                x as i32,
                y as i32,
                [
                    mul_div255_u8(u16::from(px[0]), keep),
                    mul_div255_u8(u16::from(px[1]), keep),
                    mul_div255_u8(u16::from(px[2]), keep),
                    px[3],
                ],
            );
        }
    }
}

/// Add seeded symmetric noise to the color channels, clamped so the buffer
/// stays valid premultiplied RGBA.
fn add_noise(surface: &mut Surface, amount: f64, seed: u64) {
    let scale = amount.clamp(0.0, 1.0) * 96.0;
    if scale <= 0.0 {
        return;
    }
    let (w, h) = (surface.width(), surface.height());
    for y in 0..h {
        for x in 0..w {
            let px = surface.pixel(x as i32, y as i32);
            if px[3] == 0 {
                continue;
            }
            let r = hash_px(seed ^ 0x6e6f_6973, x, y) % 2001;
            let delta = (((r as f64 / 1000.0) - 1.0) * scale).round() as i32;
            let a = i32::from(px[3]);
            let mut out = px;
            for chan in out.iter_mut().take(3) {
                *chan = (i32::from(*chan) + delta).clamp(0, a) as u8;
            }
            surface.set_pixel(x as i32, y as i32, out);
        }
    }
}
