use crate::{
    effects::blur::blur_surface,
    foundation::error::MosaiqResult,
    foundation::math::smoothstep,
    render::surface::{Surface, crossfade_px},
    scene::model::BokehFx,
};

/// Depth-of-field: a fully blurred copy of the canvas is revealed outside a
/// radial focal window, keeping the original sharp inside it.
///
/// The window is fully sharp within `0.5 * focal_radius` and fades to fully
/// blurred by `2.0 * focal_radius`.
pub fn apply_bokeh(surface: &Surface, fx: &BokehFx) -> MosaiqResult<Surface> {
    let radius =
        (fx.intensity.clamp(0.0, 100.0) / 100.0 * fx.quality.base_radius()).round() as u32;
    if radius == 0 {
        return Ok(surface.clone());
    }

    let blurred = blur_surface(surface, radius)?;
    let (w, h) = (surface.width(), surface.height());

    let cx = (fx.center_x_pct / 100.0) as f32 * w as f32;
    let cy = (fx.center_y_pct / 100.0) as f32 * h as f32;
    let min_dim = w.min(h) as f32;
    let focal_r = ((fx.focal_size_pct / 100.0) as f32 * min_dim / 2.0).max(1.0);
    let sharp_edge = focal_r * 0.5;
    let blur_edge = focal_r * 2.0;

    let mut out = Surface::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let sharpness = 1.0 - smoothstep(sharp_edge, blur_edge, dist);
            let px = crossfade_px(
                blurred.pixel(x as i32, y as i32),
                surface.pixel(x as i32, y as i32),
                sharpness,
            );
            out.set_pixel(x as i32, y as i32, px);
        }
    }
    Ok(out)
}
