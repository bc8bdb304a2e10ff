use crate::{
    assets::decode::PreparedImage,
    effects::blur::blur_surface,
    foundation::core::{Canvas, Rect, Rgba8Premul, aspect_fit},
    foundation::error::{MosaiqError, MosaiqResult},
    layout::solver::{Slot, SlotFit},
    render::filters::FilterChain,
    render::mask::{apply_border, apply_gradient_mask, apply_shape_mask},
    render::surface::{Surface, blend_src_over_px},
    scene::model::{BlendMode, CropRect, FilterSettings, ImageSettings},
};

/// Composite a prepared layer onto `dst`, rotated about `(cx, cy)`.
///
/// Rotation 0 takes an exact integer blit; otherwise destination pixels in
/// the rotated bounding box are inverse-mapped and bilinearly sampled.
pub(crate) fn draw_transformed(
    dst: &mut Surface,
    layer: &Surface,
    cx: f64,
    cy: f64,
    rotation_deg: f64,
    blend: BlendMode,
    opacity: f32,
) {
    let lw = f64::from(layer.width());
    let lh = f64::from(layer.height());

    if rotation_deg == 0.0 {
        let x0 = (cx - lw / 2.0).round() as i32;
        let y0 = (cy - lh / 2.0).round() as i32;
        for ly in 0..layer.height() as i32 {
            for lx in 0..layer.width() as i32 {
                let src = layer.pixel(lx, ly);
                if src[3] == 0 {
                    continue;
                }
                let d = dst.pixel(x0 + lx, y0 + ly);
                dst.set_pixel(x0 + lx, y0 + ly, blend_src_over_px(d, src, opacity, blend));
            }
        }
        return;
    }

    let rad = rotation_deg.to_radians();
    let (sin, cos) = rad.sin_cos();

    // Rotated bounding box around the anchor.
    let half_w = (cos.abs() * lw + sin.abs() * lh) / 2.0;
    let half_h = (sin.abs() * lw + cos.abs() * lh) / 2.0;
    let x_min = ((cx - half_w).floor() as i32).max(0);
    let x_max = ((cx + half_w).ceil() as i32).min(dst.width() as i32 - 1);
    let y_min = ((cy - half_h).floor() as i32).max(0);
    let y_max = ((cy + half_h).ceil() as i32).min(dst.height() as i32 - 1);

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            // Inverse rotation back into layer space.
            let lx = cos * dx + sin * dy + lw / 2.0 - 0.5;
            let ly = -sin * dx + cos * dy + lh / 2.0 - 0.5;
            if lx < -1.0 || ly < -1.0 || lx > lw || ly > lh {
                continue;
            }
            let src = layer.sample_bilinear(lx as f32, ly as f32);
            if src[3] == 0 {
                continue;
            }
            let d = dst.pixel(x, y);
            dst.set_pixel(x, y, blend_src_over_px(d, src, opacity, blend));
        }
    }
}

/// Resample a cropped region of a source image into `out_w x out_h`,
/// applying flips. Sampling is bilinear and center-aligned, so an identity
/// mapping copies pixels exactly.
pub(crate) fn scale_image_region(
    image: &PreparedImage,
    src_x: f64,
    src_y: f64,
    src_w: f64,
    src_h: f64,
    out_w: u32,
    out_h: u32,
    flip_h: bool,
    flip_v: bool,
) -> MosaiqResult<Surface> {
    if src_w <= 0.0 || src_h <= 0.0 {
        return Err(MosaiqError::render("crop region has no extent"));
    }
    let src = Surface::from_image(image)?;
    let mut out = Surface::new(out_w, out_h)?;

    let sx_step = src_w / f64::from(out_w);
    let sy_step = src_h / f64::from(out_h);

    for y in 0..out_h {
        let oy = if flip_v { out_h - 1 - y } else { y };
        let sy = src_y + (f64::from(oy) + 0.5) * sy_step - 0.5;
        for x in 0..out_w {
            let ox = if flip_h { out_w - 1 - x } else { x };
            let sx = src_x + (f64::from(ox) + 0.5) * sx_step - 0.5;
            let px = src.sample_bilinear(sx as f32, sy as f32);
            out.set_pixel(x as i32, y as i32, px);
        }
    }
    Ok(out)
}

/// Render an image aspect-fit and centered on a transparent canvas-size
/// surface (used by transitions and double exposure).
pub(crate) fn letterbox_image(image: &PreparedImage, canvas: Canvas) -> MosaiqResult<Surface> {
    let mut out = Surface::new(canvas.width, canvas.height)?;
    let outer = Rect::new(
        0.0,
        0.0,
        f64::from(canvas.width),
        f64::from(canvas.height),
    );
    let fit = aspect_fit(f64::from(image.width), f64::from(image.height), outer);
    let layer = scale_image_region(
        image,
        0.0,
        0.0,
        f64::from(image.width),
        f64::from(image.height),
        fit.width().max(1.0).round() as u32,
        fit.height().max(1.0).round() as u32,
        false,
        false,
    )?;
    draw_transformed(
        &mut out,
        &layer,
        fit.center().x,
        fit.center().y,
        0.0,
        BlendMode::Normal,
        1.0,
    );
    Ok(out)
}

/// Render one image into its layout slot on the target surface.
///
/// Stage order is fixed: crop -> scale into the slot -> flips -> filter
/// chain -> shape mask -> gradient mask -> rounded-rect clip/border ->
/// composite with rotation, blend mode and per-image opacity. The offscreen
/// layer doubles as the isolation buffer for masks, so a gradient never
/// bleeds onto neighbouring images.
pub fn render_image_into(
    dst: &mut Surface,
    image: &PreparedImage,
    slot: &Slot,
    settings: &ImageSettings,
    filters: &FilterSettings,
    blend: BlendMode,
) -> MosaiqResult<()> {
    render_image_with_chain(dst, image, slot, settings, &FilterChain::compile(filters), blend)
}

/// Same as [`render_image_into`] with a pre-compiled filter chain, so the
/// scene pipeline compiles the global chain once instead of per image.
pub(crate) fn render_image_with_chain(
    dst: &mut Surface,
    image: &PreparedImage,
    slot: &Slot,
    settings: &ImageSettings,
    filters: &FilterChain,
    blend: BlendMode,
) -> MosaiqResult<()> {
    if image.width == 0 || image.height == 0 {
        return Err(MosaiqError::render("image has zero dimensions"));
    }

    if let Some(frame) = &slot.frame {
        draw_polaroid_frame(dst, slot)?;
        return render_into_rect(
            dst,
            image,
            frame.inset,
            slot.rotation_deg,
            SlotFit::Contain,
            settings,
            filters,
            blend,
        );
    }

    render_into_rect(
        dst,
        image,
        slot.rect,
        slot.rotation_deg,
        slot.fit,
        settings,
        filters,
        blend,
    )
}

#[allow(clippy::too_many_arguments)]
fn render_into_rect(
    dst: &mut Surface,
    image: &PreparedImage,
    rect: Rect,
    slot_rotation_deg: f64,
    fit: SlotFit,
    settings: &ImageSettings,
    filters: &FilterChain,
    blend: BlendMode,
) -> MosaiqResult<()> {
    let crop = settings.crop.unwrap_or_else(CropRect::full);
    let sx = crop.x / 100.0 * f64::from(image.width);
    let sy = crop.y / 100.0 * f64::from(image.height);
    let sw = crop.width / 100.0 * f64::from(image.width);
    let sh = crop.height / 100.0 * f64::from(image.height);

    let (layer_rect, src_x, src_y, src_w, src_h) = match fit {
        SlotFit::Contain => {
            let fitted = aspect_fit(sw, sh, rect);
            (fitted, sx, sy, sw, sh)
        }
        SlotFit::Cover => {
            // Source window that maps exactly onto the slot when scaled by
            // the covering factor.
            let scale = (rect.width() / sw).max(rect.height() / sh);
            let win_w = rect.width() / scale;
            let win_h = rect.height() / scale;
            (
                rect,
                sx + (sw - win_w) / 2.0,
                sy + (sh - win_h) / 2.0,
                win_w,
                win_h,
            )
        }
    };

    let out_w = layer_rect.width().round().max(1.0) as u32;
    let out_h = layer_rect.height().round().max(1.0) as u32;
    let mut layer = scale_image_region(
        image,
        src_x,
        src_y,
        src_w,
        src_h,
        out_w,
        out_h,
        settings.transform.flip_h,
        settings.transform.flip_v,
    )?;

    filters.apply(&mut layer)?;

    if let Some(mask) = &settings.mask {
        apply_shape_mask(&mut layer, mask.shape, mask.invert);
        if let Some(gradient) = &mask.gradient {
            apply_gradient_mask(&mut layer, gradient);
        }
    }
    if let Some(border) = &settings.border {
        apply_border(&mut layer, border);
    }

    let rotation = slot_rotation_deg + settings.transform.rotation_deg;
    draw_transformed(
        dst,
        &layer,
        layer_rect.center().x,
        layer_rect.center().y,
        rotation,
        blend,
        settings.opacity.clamp(0.0, 1.0) as f32,
    );
    Ok(())
}

/// White polaroid frame with a soft shadow, rotated with its slot.
fn draw_polaroid_frame(dst: &mut Surface, slot: &Slot) -> MosaiqResult<()> {
    let fw = slot.rect.width().round().max(1.0) as u32;
    let fh = slot.rect.height().round().max(1.0) as u32;

    // Shadow: blurred silhouette slightly offset behind the frame.
    const SHADOW_PAD: u32 = 12;
    let mut silhouette = Surface::new(fw + 2 * SHADOW_PAD, fh + 2 * SHADOW_PAD)?;
    for y in SHADOW_PAD..SHADOW_PAD + fh {
        for x in SHADOW_PAD..SHADOW_PAD + fw {
            silhouette.set_pixel(x as i32, y as i32, [0, 0, 0, 90]);
        }
    }
    let shadow = blur_surface(&silhouette, 6)?;
    draw_transformed(
        dst,
        &shadow,
        slot.rect.center().x + 4.0,
        slot.rect.center().y + 6.0,
        slot.rotation_deg,
        BlendMode::Normal,
        1.0,
    );

    let frame = Surface::filled(
        fw,
        fh,
        Rgba8Premul {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        },
    )?;
    draw_transformed(
        dst,
        &frame,
        slot.rect.center().x,
        slot.rect.center().y,
        slot.rotation_deg,
        BlendMode::Normal,
        1.0,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::solver::PolaroidFrame;
    use std::sync::Arc;

    fn checker_image(w: u32, h: u32) -> PreparedImage {
        let mut data = vec![0u8; (w * h * 4) as usize];
        for y in 0..h {
            for x in 0..w {
                let idx = ((y * w + x) * 4) as usize;
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                data[idx..idx + 4].copy_from_slice(&[v, v, v, 255]);
            }
        }
        PreparedImage {
            width: w,
            height: h,
            rgba8_premul: Arc::new(data),
        }
    }

    fn slot(rect: Rect) -> Slot {
        Slot {
            rect,
            rotation_deg: 0.0,
            fit: SlotFit::Contain,
            frame: None,
        }
    }

    #[test]
    fn full_crop_matches_no_crop_exactly() {
        let image = checker_image(16, 16);
        let target = slot(Rect::new(0.0, 0.0, 16.0, 16.0));
        let filters = FilterSettings::default();

        let mut plain = Surface::new(16, 16).unwrap();
        render_image_into(
            &mut plain,
            &image,
            &target,
            &ImageSettings::default(),
            &filters,
            BlendMode::Normal,
        )
        .unwrap();

        let mut cropped = Surface::new(16, 16).unwrap();
        render_image_into(
            &mut cropped,
            &image,
            &target,
            &ImageSettings {
                crop: Some(CropRect::full()),
                ..ImageSettings::default()
            },
            &filters,
            BlendMode::Normal,
        )
        .unwrap();

        assert_eq!(plain, cropped);
    }

    #[test]
    fn identity_draw_copies_pixels() {
        let image = checker_image(8, 8);
        let target = slot(Rect::new(0.0, 0.0, 8.0, 8.0));
        let filters = FilterSettings::default();
        let mut out = Surface::new(8, 8).unwrap();
        render_image_into(
            &mut out,
            &image,
            &target,
            &ImageSettings::default(),
            &filters,
            BlendMode::Normal,
        )
        .unwrap();
        assert_eq!(out.data(), image.rgba8_premul.as_slice());
    }

    #[test]
    fn flip_h_mirrors_columns() {
        let image = checker_image(4, 1);
        let layer = scale_image_region(&image, 0.0, 0.0, 4.0, 1.0, 4, 1, true, false).unwrap();
        let plain = scale_image_region(&image, 0.0, 0.0, 4.0, 1.0, 4, 1, false, false).unwrap();
        for x in 0..4 {
            assert_eq!(layer.pixel(x, 0), plain.pixel(3 - x, 0));
        }
    }

    #[test]
    fn cover_fit_fills_entire_slot() {
        let image = checker_image(10, 20);
        let mut out = Surface::new(20, 10).unwrap();
        let target = Slot {
            rect: Rect::new(0.0, 0.0, 20.0, 10.0),
            rotation_deg: 0.0,
            fit: SlotFit::Cover,
            frame: None,
        };
        let filters = FilterSettings::default();
        render_image_into(
            &mut out,
            &image,
            &target,
            &ImageSettings::default(),
            &filters,
            BlendMode::Normal,
        )
        .unwrap();
        for y in 0..10 {
            for x in 0..20 {
                assert_eq!(out.pixel(x, y)[3], 255, "uncovered pixel at {x},{y}");
            }
        }
    }

    #[test]
    fn polaroid_frame_paints_white_border_around_inset() {
        let image = checker_image(8, 8);
        let mut out = Surface::new(60, 60).unwrap();
        let rect = Rect::new(10.0, 10.0, 50.0, 50.0);
        let target = Slot {
            rect,
            rotation_deg: 0.0,
            fit: SlotFit::Contain,
            frame: Some(PolaroidFrame {
                inset: Rect::new(14.0, 14.0, 46.0, 40.0),
            }),
        };
        let filters = FilterSettings::default();
        render_image_into(
            &mut out,
            &image,
            &target,
            &ImageSettings::default(),
            &filters,
            BlendMode::Normal,
        )
        .unwrap();
        // Bottom strip of the frame (below the inset) stays white.
        assert_eq!(&out.pixel(30, 46)[0..3], &[255, 255, 255]);
    }

    #[test]
    fn letterbox_centers_image() {
        let image = checker_image(10, 10);
        let canvas = Canvas {
            width: 30,
            height: 10,
        };
        let out = letterbox_image(&image, canvas).unwrap();
        assert_eq!(out.pixel(0, 5)[3], 0);
        assert_eq!(out.pixel(15, 5)[3], 255);
        assert_eq!(out.pixel(29, 5)[3], 0);
    }
}
