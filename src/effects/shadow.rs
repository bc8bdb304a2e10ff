use kurbo::Shape;

use crate::{
    effects::blur::blur_surface,
    foundation::core::Point,
    foundation::error::MosaiqResult,
    render::mask::path_coverage,
    render::surface::{Surface, composite_over, premul_over_px},
    scene::model::{BlendMode, ShadowFx, ShadowMode},
};

/// Synthesize a canvas shadow according to the configured mode.
///
/// `Drop` and `Angle` render the content silhouette into an expanded buffer
/// (so the blur never clips), colorize and blur it, then composite the
/// content back over it. `Curved` paints a blurred ellipse behind the
/// content at the bottom edge. `Inner` darkens content pixels from the
/// offset complement of the alpha channel.
pub fn apply_shadow(surface: &Surface, fx: &ShadowFx) -> MosaiqResult<Surface> {
    match fx.mode {
        ShadowMode::Drop { offset_x, offset_y } => offset_shadow(surface, fx, offset_x, offset_y),
        ShadowMode::Angle {
            angle_deg,
            distance,
        } => {
            let rad = angle_deg.to_radians();
            offset_shadow(surface, fx, distance * rad.cos(), distance * rad.sin())
        }
        ShadowMode::Curved { curve_pct } => curved_shadow(surface, fx, curve_pct),
        ShadowMode::Inner { offset_x, offset_y } => inner_shadow(surface, fx, offset_x, offset_y),
    }
}

fn shadow_px(fx: &ShadowFx, weight: f32) -> [u8; 4] {
    let a = (fx.alpha.clamp(0.0, 1.0) as f32) * weight.clamp(0.0, 1.0);
    let c = fx.color.to_rgba8_straight();
    [
        (f32::from(c[0]) * a).round() as u8,
        (f32::from(c[1]) * a).round() as u8,
        (f32::from(c[2]) * a).round() as u8,
        (255.0 * a).round() as u8,
    ]
}

fn offset_shadow(
    surface: &Surface,
    fx: &ShadowFx,
    offset_x: f64,
    offset_y: f64,
) -> MosaiqResult<Surface> {
    let (w, h) = (surface.width(), surface.height());
    let blur_r = fx.blur_px.clamp(0.0, 64.0).round() as u32;
    let pad = blur_r + offset_x.abs().max(offset_y.abs()).ceil() as u32 + 1;

    let mut expanded = Surface::new(w + 2 * pad, h + 2 * pad)?;
    let dx = offset_x.round() as i32;
    let dy = offset_y.round() as i32;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let a = surface.pixel(x, y)[3];
            if a == 0 {
                continue;
            }
            expanded.set_pixel(
                x + pad as i32 + dx,
                y + pad as i32 + dy,
                shadow_px(fx, f32::from(a) / 255.0),
            );
        }
    }
    let blurred = blur_surface(&expanded, blur_r)?;

    let mut out = Surface::new(w, h)?;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            out.set_pixel(x, y, blurred.pixel(x + pad as i32, y + pad as i32));
        }
    }
    composite_over(&mut out, surface, 1.0, BlendMode::Normal)?;
    Ok(out)
}

fn curved_shadow(surface: &Surface, fx: &ShadowFx, curve_pct: f64) -> MosaiqResult<Surface> {
    let (w, h) = (surface.width(), surface.height());
    let shadow_h = (curve_pct.clamp(0.0, 100.0) / 100.0) * f64::from(h);
    if shadow_h <= 0.0 {
        return Ok(surface.clone());
    }

    let ellipse = kurbo::Ellipse::new(
        Point::new(f64::from(w) / 2.0, f64::from(h) - shadow_h / 2.0),
        (0.4 * f64::from(w), shadow_h / 2.0),
        0.0,
    )
    .to_path(0.1);

    let mut shadow = Surface::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            let coverage = path_coverage(&ellipse, x, y);
            if coverage <= 0.0 {
                continue;
            }
            shadow.set_pixel(x as i32, y as i32, shadow_px(fx, coverage));
        }
    }
    let mut out = blur_surface(&shadow, fx.blur_px.clamp(0.0, 64.0).round() as u32)?;
    // Shadow sits behind the existing content.
    composite_over(&mut out, surface, 1.0, BlendMode::Normal)?;
    Ok(out)
}

fn inner_shadow(
    surface: &Surface,
    fx: &ShadowFx,
    offset_x: f64,
    offset_y: f64,
) -> MosaiqResult<Surface> {
    let (w, h) = (surface.width(), surface.height());
    let blur_r = fx.blur_px.clamp(0.0, 64.0).round() as u32;
    let pad = blur_r + offset_x.abs().max(offset_y.abs()).ceil() as u32 + 1;

    // Complement of the content alpha; the area beyond the canvas counts as
    // fully transparent content, so edges cast inward.
    let full = shadow_px(fx, 1.0);
    let mut complement = Surface::filled(
        w + 2 * pad,
        h + 2 * pad,
        crate::foundation::core::Rgba8Premul {
            r: full[0],
            g: full[1],
            b: full[2],
            a: full[3],
        },
    )?;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let a = surface.pixel(x, y)[3];
            let weight = 1.0 - f32::from(a) / 255.0;
            complement.set_pixel(x + pad as i32, y + pad as i32, shadow_px(fx, weight));
        }
    }
    let blurred = blur_surface(&complement, blur_r)?;

    let dx = offset_x.round() as i32;
    let dy = offset_y.round() as i32;
    let mut out = surface.clone();
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let content_a = surface.pixel(x, y)[3];
            if content_a == 0 {
                continue;
            }
            let s = blurred.pixel(x + pad as i32 - dx, y + pad as i32 - dy);
            if s[3] == 0 {
                continue;
            }
            // source-atop: the shadow only lands on opaque content.
            let atop = crate::render::mask::scale_px_coverage(s, f32::from(content_a) / 255.0);
            let d = out.pixel(x, y);
            out.set_pixel(x, y, premul_over_px(d, atop));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::color::ColorDef;

    fn fx(mode: ShadowMode) -> ShadowFx {
        ShadowFx {
            mode,
            color: ColorDef::BLACK,
            alpha: 0.8,
            blur_px: 4.0,
        }
    }

    fn content_with_margin() -> Surface {
        let mut s = Surface::new(40, 40).unwrap();
        for y in 8..32 {
            for x in 8..32 {
                s.set_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        s
    }

    #[test]
    fn drop_shadow_darkens_offset_margin() {
        let content = content_with_margin();
        let out = apply_shadow(
            &content,
            &fx(ShadowMode::Drop {
                offset_x: 5.0,
                offset_y: 5.0,
            }),
        )
        .unwrap();
        // Below-right of the content square the shadow is visible.
        assert!(out.pixel(34, 34)[3] > 0);
        // Content itself is preserved on top.
        assert_eq!(&out.pixel(16, 16)[0..3], &[255, 255, 255]);
        // Far corner opposite the offset stays clear.
        assert_eq!(out.pixel(1, 1)[3], 0);
    }

    #[test]
    fn angle_shadow_matches_equivalent_drop() {
        let content = content_with_margin();
        let by_angle = apply_shadow(
            &content,
            &fx(ShadowMode::Angle {
                angle_deg: 0.0,
                distance: 6.0,
            }),
        )
        .unwrap();
        let by_drop = apply_shadow(
            &content,
            &fx(ShadowMode::Drop {
                offset_x: 6.0,
                offset_y: 0.0,
            }),
        )
        .unwrap();
        assert_eq!(by_angle, by_drop);
    }

    #[test]
    fn curved_shadow_sits_at_the_bottom_behind_content() {
        let content = content_with_margin();
        let out = apply_shadow(&content, &fx(ShadowMode::Curved { curve_pct: 20.0 })).unwrap();
        // Bottom center (outside the content square) gained shadow.
        assert!(out.pixel(20, 37)[3] > 0);
        // Top margin unchanged.
        assert_eq!(out.pixel(20, 2)[3], 0);
    }

    #[test]
    fn inner_shadow_only_touches_content_pixels() {
        let content = content_with_margin();
        let out = apply_shadow(
            &content,
            &fx(ShadowMode::Inner {
                offset_x: 3.0,
                offset_y: 3.0,
            }),
        )
        .unwrap();
        // Margin pixels stay empty.
        assert_eq!(out.pixel(2, 2)[3], 0);
        assert_eq!(out.pixel(36, 36)[3], 0);
        // Content edge near the offset darkens, center keeps its alpha.
        let edge = out.pixel(9, 9);
        assert!(edge[0] < 255);
        assert_eq!(out.pixel(20, 20)[3], 255);
    }
}
