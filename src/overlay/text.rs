use ab_glyph::{Font, ScaleFont};

use crate::{
    assets::store::PreparedAssetStore,
    effects::blur::blur_surface,
    foundation::error::MosaiqResult,
    render::layer::draw_transformed,
    render::surface::Surface,
    scene::model::{BlendMode, TextAlign, TextLayer},
};

/// Extra space around the rasterized text block so stroke dilation, shear
/// and shadow blur never clip.
fn block_pad(layer: &TextLayer) -> u32 {
    let shadow = layer
        .shadow
        .map(|s| s.blur_px + s.offset_x.abs().max(s.offset_y.abs()))
        .unwrap_or(0.0);
    (f64::from(layer.size_px) * 0.5 + layer.stroke_width + shadow).ceil() as u32 + 2
}

/// Rasterized text block: a coverage-only surface (white premul, alpha =
/// glyph coverage) plus the anchor of the first-line baseline inside it.
struct TextBlock {
    coverage: Surface,
    anchor_x: f64,
    anchor_y: f64,
}

/// Draw one text layer onto the canvas: shadow first, then stroke, then
/// fill, exactly in that order.
pub fn draw_text_layer(
    dst: &mut Surface,
    layer: &TextLayer,
    store: &PreparedAssetStore,
) -> MosaiqResult<()> {
    let font = &store.font(&layer.font_source)?.font;
    let block = rasterize_block(font, layer)?;

    let x = layer.x_pct / 100.0 * f64::from(dst.width());
    let y = layer.y_pct / 100.0 * f64::from(dst.height());
    let top_left_x = x - block.anchor_x;
    let top_left_y = y - block.anchor_y;

    if let Some(shadow) = &layer.shadow {
        let tinted = tint_coverage(&block.coverage, shadow.color.to_rgba8_premul().to_array());
        let blurred = blur_surface(&tinted, shadow.blur_px.clamp(0.0, 64.0).round() as u32)?;
        blit(dst, &blurred, top_left_x + shadow.offset_x, top_left_y + shadow.offset_y);
    }

    if layer.stroke_width > 0.0 {
        let dilated = dilate_coverage(&block.coverage, layer.stroke_width);
        let tinted = tint_coverage(&dilated, layer.stroke_color.to_rgba8_premul().to_array());
        blit(dst, &tinted, top_left_x, top_left_y);
    }

    let tinted = tint_coverage(&block.coverage, layer.color.to_rgba8_premul().to_array());
    blit(dst, &tinted, top_left_x, top_left_y);
    Ok(())
}

fn blit(dst: &mut Surface, src: &Surface, top_left_x: f64, top_left_y: f64) {
    draw_transformed(
        dst,
        src,
        top_left_x + f64::from(src.width()) / 2.0,
        top_left_y + f64::from(src.height()) / 2.0,
        0.0,
        BlendMode::Normal,
        1.0,
    );
}

fn rasterize_block(font: &ab_glyph::FontArc, layer: &TextLayer) -> MosaiqResult<TextBlock> {
    let scale = ab_glyph::PxScale::from(layer.size_px);
    let scaled = font.as_scaled(scale);
    let pad = f64::from(block_pad(layer));

    let lines: Vec<&str> = layer.text.split('\n').collect();
    let line_height = f64::from(scaled.ascent() - scaled.descent() + scaled.line_gap());
    let widths: Vec<f64> = lines.iter().map(|l| line_width(&scaled, l)).collect();
    let max_width = widths.iter().cloned().fold(1.0, f64::max);

    let block_w = (max_width + 2.0 * pad).ceil() as u32;
    let block_h = (line_height * lines.len() as f64 + 2.0 * pad).ceil() as u32;
    let mut coverage = Surface::new(block_w.max(1), block_h.max(1))?;

    // Italic shear leans glyph tops to the right about the first baseline.
    let shear = if layer.italic { 0.21 } else { 0.0 };
    let first_baseline = pad + f64::from(scaled.ascent());

    for (li, line) in lines.iter().enumerate() {
        let line_x = pad
            + match layer.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (max_width - widths[li]) / 2.0,
                TextAlign::Right => max_width - widths[li],
            };
        let baseline = first_baseline + line_height * li as f64;
        let mut cursor = line_x as f32;

        for ch in line.chars() {
            let glyph_id = scaled.glyph_id(ch);
            let glyph = glyph_id
                .with_scale_and_position(scale, ab_glyph::point(cursor, baseline as f32));

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                // Faux bold stamps the outline twice, one pixel apart.
                let stamps: &[f32] = if layer.bold { &[0.0, 1.0] } else { &[0.0] };
                for &stamp_dx in stamps {
                    outlined.draw(|px, py, c| {
                        let gy = bounds.min.y as f64 + f64::from(py);
                        let lean = shear * (first_baseline - gy);
                        let gx =
                            bounds.min.x as f64 + f64::from(px) + f64::from(stamp_dx) + lean;
                        stamp_max(&mut coverage, gx.round() as i32, gy.round() as i32, c);
                    });
                }
            }
            cursor += scaled.h_advance(glyph_id);
        }
    }

    Ok(TextBlock {
        coverage,
        anchor_x: pad
            + match layer.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => max_width / 2.0,
                TextAlign::Right => max_width,
            },
        anchor_y: first_baseline,
    })
}

fn line_width<F: Font, SF: ScaleFont<F>>(scaled: &SF, line: &str) -> f64 {
    line.chars()
        .map(|ch| f64::from(scaled.h_advance(scaled.glyph_id(ch))))
        .sum()
}

fn stamp_max(coverage: &mut Surface, x: i32, y: i32, c: f32) {
    let v = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    if v == 0 {
        return;
    }
    let existing = coverage.pixel(x, y)[3];
    let a = existing.max(v);
    coverage.set_pixel(x, y, [a, a, a, a]);
}

/// Max-dilate a coverage surface by radius `r` (16 angular taps), used for
/// the faux text outline.
fn dilate_coverage(src: &Surface, r: f64) -> Surface {
    let mut out = src.clone();
    let taps: Vec<(i32, i32)> = (0..16)
        .map(|i| {
            let angle = std::f64::consts::PI * 2.0 * f64::from(i) / 16.0;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect();
    for y in 0..src.height() as i32 {
        for x in 0..src.width() as i32 {
            let mut best = src.pixel(x, y)[3];
            for &(dx, dy) in &taps {
                best = best.max(src.pixel(x - dx, y - dy)[3]);
            }
            let a = best;
            out.set_pixel(x, y, [a, a, a, a]);
        }
    }
    out
}

/// Multiply a premultiplied color through a coverage surface.
fn tint_coverage(coverage: &Surface, color: [u8; 4]) -> Surface {
    let mut out = coverage.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        px[0] = ((u16::from(color[0]) * a + 127) / 255) as u8;
        px[1] = ((u16::from(color[1]) * a + 127) / 255) as u8;
        px[2] = ((u16::from(color[2]) * a + 127) / 255) as u8;
        px[3] = ((u16::from(color[3]) * a + 127) / 255) as u8;
    }
    out
}
