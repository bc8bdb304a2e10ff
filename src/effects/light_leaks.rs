use crate::{
    assets::store::PreparedAssetStore,
    foundation::error::MosaiqResult,
    render::layer::{draw_transformed, scale_image_region},
    render::surface::Surface,
    scene::model::LightLeakOverlay,
};

/// Blend an ordered list of light-leak overlays onto the canvas.
///
/// Overlays composite strictly sequentially: each draw sees the result of
/// all prior overlays. Each overlay is scaled to `canvas_width * scale_pct`
/// (aspect preserved), positioned by percentage and rotated about its own
/// center.
pub fn apply_light_leaks(
    dst: &mut Surface,
    leaks: &[LightLeakOverlay],
    store: &PreparedAssetStore,
) -> MosaiqResult<()> {
    for leak in leaks {
        let image = store.image(&leak.source)?;
        let out_w = (f64::from(dst.width()) * leak.scale_pct / 100.0)
            .round()
            .max(1.0) as u32;
        let out_h = (f64::from(out_w) * f64::from(image.height) / f64::from(image.width))
            .round()
            .max(1.0) as u32;

        let layer = scale_image_region(
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

        let cx = leak.x_pct / 100.0 * f64::from(dst.width());
        let cy = leak.y_pct / 100.0 * f64::from(dst.height());
        draw_transformed(
            dst,
            &layer,
            cx,
            cy,
            leak.rotation_deg,
            leak.blend,
            leak.opacity.clamp(0.0, 1.0) as f32,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::decode::PreparedImage;
    use crate::scene::model::BlendMode;
    use std::sync::Arc;

    fn store_with_leak(w: u32, h: u32, px: [u8; 4]) -> PreparedAssetStore {
        let mut store = PreparedAssetStore::in_memory();
        let data = px.repeat((w * h) as usize);
        store
            .insert_image(
                "leak.png",
                PreparedImage {
                    width: w,
                    height: h,
                    rgba8_premul: Arc::new(data),
                },
            )
            .unwrap();
        store
    }

    fn leak() -> LightLeakOverlay {
        LightLeakOverlay {
            source: "leak.png".to_string(),
            blend: BlendMode::Screen,
            opacity: 1.0,
            scale_pct: 100.0,
            x_pct: 50.0,
            y_pct: 50.0,
            rotation_deg: 0.0,
        }
    }

    #[test]
    fn empty_list_is_a_noop() {
        let store = PreparedAssetStore::in_memory();
        let mut dst = Surface::new(8, 8).unwrap();
        let before = dst.clone();
        apply_light_leaks(&mut dst, &[], &store).unwrap();
        assert_eq!(dst, before);
    }

    #[test]
    fn screen_leak_brightens_canvas() {
        let store = store_with_leak(4, 4, [128, 64, 32, 255]);
        let mut dst = Surface::filled(
            4,
            4,
            crate::foundation::core::Rgba8Premul {
                r: 64,
                g: 64,
                b: 64,
                a: 255,
            },
        )
        .unwrap();
        apply_light_leaks(&mut dst, &[leak()], &store).unwrap();
        let px = dst.pixel(2, 2);
        assert!(px[0] > 128);
        assert!(px[1] > 64);
    }

    #[test]
    fn missing_source_is_an_error() {
        let store = PreparedAssetStore::in_memory();
        let mut dst = Surface::new(4, 4).unwrap();
        assert!(apply_light_leaks(&mut dst, &[leak()], &store).is_err());
    }
}
