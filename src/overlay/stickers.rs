use ab_glyph::{Font, ScaleFont};

use crate::{
    assets::store::PreparedAssetStore,
    foundation::error::MosaiqResult,
    render::layer::draw_transformed,
    render::surface::Surface,
    scene::model::{BlendMode, StickerLayer},
};

/// Draw all stickers, sorted ascending by `z_index` (ties keep scene order).
pub fn draw_stickers(
    dst: &mut Surface,
    stickers: &[StickerLayer],
    store: &PreparedAssetStore,
) -> MosaiqResult<()> {
    let mut order: Vec<&StickerLayer> = stickers.iter().collect();
    order.sort_by_key(|s| s.z_index);
    for sticker in order {
        draw_sticker(dst, sticker, store)?;
    }
    Ok(())
}

/// Rasterize the sticker glyphs at `height` px, tint them, then blit with
/// rotation about the sticker's own center.
fn draw_sticker(
    dst: &mut Surface,
    sticker: &StickerLayer,
    store: &PreparedAssetStore,
) -> MosaiqResult<()> {
    let font = &store.font(&sticker.font_source)?.font;
    let scale = ab_glyph::PxScale::from(sticker.height as f32);
    let scaled = font.as_scaled(scale);

    let width: f32 = sticker
        .glyph
        .chars()
        .map(|ch| scaled.h_advance(scaled.glyph_id(ch)))
        .sum();
    let block_w = (width.ceil() as u32).max(1);
    let block_h = (sticker.height.ceil() as u32).max(1);
    let mut layer = Surface::new(block_w, block_h)?;

    let color = sticker.color.to_rgba8_premul().to_array();
    let baseline = scaled.ascent();
    let mut cursor = 0.0f32;
    for ch in sticker.glyph.chars() {
        let glyph_id = scaled.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, c| {
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                let w = (c.clamp(0.0, 1.0) * 255.0).round() as u16;
                if w == 0 {
                    return;
                }
                let tinted = [
                    ((u16::from(color[0]) * w + 127) / 255) as u8,
                    ((u16::from(color[1]) * w + 127) / 255) as u8,
                    ((u16::from(color[2]) * w + 127) / 255) as u8,
                    ((u16::from(color[3]) * w + 127) / 255) as u8,
                ];
                layer.over_pixel(x, y, tinted);
            });
        }
        cursor += scaled.h_advance(glyph_id);
    }

    // Squeeze the glyph block to the requested sticker width.
    let layer = if (f64::from(block_w) - sticker.width).abs() > 0.5 {
        resize_nearest(&layer, sticker.width.round().max(1.0) as u32, block_h)?
    } else {
        layer
    };

    let cx = sticker.x_pct / 100.0 * f64::from(dst.width());
    let cy = sticker.y_pct / 100.0 * f64::from(dst.height());
    draw_transformed(
        dst,
        &layer,
        cx,
        cy,
        sticker.rotation_deg,
        BlendMode::Normal,
        sticker.opacity.clamp(0.0, 1.0) as f32,
    );
    Ok(())
}

fn resize_nearest(src: &Surface, out_w: u32, out_h: u32) -> MosaiqResult<Surface> {
    let mut out = Surface::new(out_w.max(1), out_h.max(1))?;
    for y in 0..out.height() {
        for x in 0..out.width() {
            let sx = (f64::from(x) + 0.5) * f64::from(src.width()) / f64::from(out.width());
            let sy = (f64::from(y) + 0.5) * f64::from(src.height()) / f64::from(out.height());
            out.set_pixel(
                x as i32,
                y as i32,
                src.pixel(sx.floor() as i32, sy.floor() as i32),
            );
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_nearest_preserves_solid_fill() {
        let src = Surface::filled(
            4,
            4,
            crate::foundation::core::Rgba8Premul {
                r: 9,
                g: 8,
                b: 7,
                a: 255,
            },
        )
        .unwrap();
        let out = resize_nearest(&src, 7, 3).unwrap();
        assert_eq!((out.width(), out.height()), (7, 3));
        assert_eq!(out.pixel(6, 2), [9, 8, 7, 255]);
    }

    #[test]
    fn stickers_sort_by_z_index() {
        let mut order = [("b", 3), ("a", 1), ("c", 2)];
        order.sort_by_key(|s| s.1);
        assert_eq!(order.map(|s| s.0), ["a", "c", "b"]);
    }
}
