use crate::{
    assets::store::PreparedAssetStore,
    foundation::core::{Rect, aspect_fit},
    foundation::error::MosaiqResult,
    render::filters::{apply_color_matrix, invert_matrix},
    render::layer::{draw_transformed, scale_image_region},
    render::surface::Surface,
    scene::model::DoubleExposureFx,
};

/// Blend a second exposure over the composited canvas.
///
/// The overlay image is letterboxed to the canvas, scaled by `scale_pct`,
/// offset in pixels from the canvas center, rotated about its own center and
/// blended with the configured mode at `opacity / 100`; `invert_overlay`
/// applies a full invert to the overlay first.
pub fn apply_double_exposure(
    dst: &mut Surface,
    fx: &DoubleExposureFx,
    store: &PreparedAssetStore,
) -> MosaiqResult<()> {
    let image = store.image(&fx.overlay)?;

    let bounds = Rect::new(0.0, 0.0, f64::from(dst.width()), f64::from(dst.height()));
    let fit = aspect_fit(f64::from(image.width), f64::from(image.height), bounds);
    let scale = fx.scale_pct.max(1.0) / 100.0;
    let out_w = (fit.width() * scale).round().max(1.0) as u32;
    let out_h = (fit.height() * scale).round().max(1.0) as u32;

    let mut layer = scale_image_region(
        image,
        0.0,
        0.0,
        f64::from(image.width),
        f64::from(image.height),
        out_w,
        out_h,
        false,
        false,
    )?;
    if fx.invert_overlay {
        apply_color_matrix(&mut layer, invert_matrix(1.0));
    }

    let cx = f64::from(dst.width()) / 2.0 + fx.offset_x;
    let cy = f64::from(dst.height()) / 2.0 + fx.offset_y;
    draw_transformed(
        dst,
        &layer,
        cx,
        cy,
        fx.rotation_deg,
        fx.blend,
        (fx.opacity.clamp(0.0, 100.0) / 100.0) as f32,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::decode::PreparedImage;
    use crate::scene::model::BlendMode;
    use std::sync::Arc;

    fn store_with_overlay(px: [u8; 4]) -> PreparedAssetStore {
        let mut store = PreparedAssetStore::in_memory();
        store
            .insert_image(
                "overlay.png",
                PreparedImage {
                    width: 8,
                    height: 8,
                    rgba8_premul: Arc::new(px.repeat(64)),
                },
            )
            .unwrap();
        store
    }

    fn fx(opacity: f64) -> DoubleExposureFx {
        DoubleExposureFx {
            overlay: "overlay.png".to_string(),
            blend: BlendMode::Screen,
            opacity,
            invert_overlay: false,
            scale_pct: 100.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation_deg: 0.0,
        }
    }

    #[test]
    fn zero_opacity_leaves_canvas_unchanged() {
        let store = store_with_overlay([255, 255, 255, 255]);
        let mut dst = Surface::filled(
            8,
            8,
            crate::foundation::core::Rgba8Premul {
                r: 50,
                g: 50,
                b: 50,
                a: 255,
            },
        )
        .unwrap();
        let before = dst.clone();
        apply_double_exposure(&mut dst, &fx(0.0), &store).unwrap();
        assert_eq!(dst, before);
    }

    #[test]
    fn screen_blend_brightens_center() {
        let store = store_with_overlay([128, 128, 128, 255]);
        let mut dst = Surface::filled(
            8,
            8,
            crate::foundation::core::Rgba8Premul {
                r: 50,
                g: 50,
                b: 50,
                a: 255,
            },
        )
        .unwrap();
        apply_double_exposure(&mut dst, &fx(100.0), &store).unwrap();
        assert!(dst.pixel(4, 4)[0] > 50);
    }

    #[test]
    fn invert_overlay_flips_channels_before_blending() {
        let store = store_with_overlay([255, 255, 255, 255]);
        let mut plain = Surface::new(8, 8).unwrap();
        let mut inverted = Surface::new(8, 8).unwrap();
        let mut f = fx(100.0);
        f.blend = BlendMode::Normal;
        apply_double_exposure(&mut plain, &f, &store).unwrap();
        f.invert_overlay = true;
        apply_double_exposure(&mut inverted, &f, &store).unwrap();
        assert_eq!(&plain.pixel(4, 4)[0..3], &[255, 255, 255]);
        assert_eq!(&inverted.pixel(4, 4)[0..3], &[0, 0, 0]);
    }
}
