use kurbo::Shape;

use crate::{
    foundation::core::{BezPath, Point},
    foundation::math::lerp_f32,
    render::surface::Surface,
    scene::model::{BorderSettings, GradientDirection, GradientMask, MaskShape},
};

/// 2x2 supersample offsets inside one pixel.
const SUBSAMPLES: [(f64, f64); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// Build the parametric mask path for a shape inscribed in a `w x h` layer.
///
/// Returns `None` for [`MaskShape::Unknown`]: unknown shapes render as
/// "no mask" rather than failing.
pub(crate) fn shape_path(shape: MaskShape, w: f64, h: f64) -> Option<BezPath> {
    let cx = w / 2.0;
    let cy = h / 2.0;
    let side = w.min(h);

    match shape {
        MaskShape::Circle => {
            Some(kurbo::Circle::new(Point::new(cx, cy), side / 2.0).to_path(0.1))
        }
        MaskShape::Square => {
            let half = side / 2.0;
            Some(kurbo::Rect::new(cx - half, cy - half, cx + half, cy + half).to_path(0.1))
        }
        MaskShape::Heart => Some(heart_path(w, h)),
        MaskShape::Star => Some(regular_star_path(cx, cy, side / 2.0)),
        MaskShape::Pentagon => Some(regular_polygon_path(cx, cy, side / 2.0, 5)),
        MaskShape::Hexagon => Some(regular_polygon_path(cx, cy, side / 2.0, 6)),
        MaskShape::Unknown => None,
    }
}

/// Classic two-lobe bezier heart filling the layer box.
fn heart_path(w: f64, h: f64) -> BezPath {
    let x = |u: f64| u * w;
    let y = |v: f64| v * h;

    let mut p = BezPath::new();
    p.move_to((x(0.5), y(0.25)));
    p.curve_to((x(0.5), y(0.175)), (x(0.425), y(0.1)), (x(0.3375), y(0.1)));
    p.curve_to((x(0.2), y(0.1)), (x(0.1), y(0.2)), (x(0.1), y(0.3375)));
    p.curve_to((x(0.1), y(0.55)), (x(0.5), y(0.9)), (x(0.5), y(0.9)));
    p.curve_to((x(0.5), y(0.9)), (x(0.9), y(0.55)), (x(0.9), y(0.3375)));
    p.curve_to((x(0.9), y(0.2)), (x(0.8), y(0.1)), (x(0.6625), y(0.1)));
    p.curve_to((x(0.575), y(0.1)), (x(0.5), y(0.175)), (x(0.5), y(0.25)));
    p.close_path();
    p
}

/// Five-point star: alternating outer/inner radius at 36 degree steps, first
/// point at the top.
fn regular_star_path(cx: f64, cy: f64, outer: f64) -> BezPath {
    let inner = outer * 0.5;
    let mut p = BezPath::new();
    for i in 0..10 {
        let r = if i % 2 == 0 { outer } else { inner };
        let angle = std::f64::consts::PI * (i as f64) / 5.0 - std::f64::consts::FRAC_PI_2;
        let pt = (cx + r * angle.cos(), cy + r * angle.sin());
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

/// Regular n-gon with the first vertex at the top.
fn regular_polygon_path(cx: f64, cy: f64, radius: f64, sides: u32) -> BezPath {
    let mut p = BezPath::new();
    for i in 0..sides {
        let angle = 2.0 * std::f64::consts::PI * (i as f64) / (sides as f64)
            - std::f64::consts::FRAC_PI_2;
        let pt = (cx + radius * angle.cos(), cy + radius * angle.sin());
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

/// Antialiased nonzero-winding coverage of `path` at one pixel.
#[inline]
pub(crate) fn path_coverage(path: &BezPath, x: u32, y: u32) -> f32 {
    let mut hits = 0u8;
    for (dx, dy) in SUBSAMPLES {
        if path.winding(Point::new(f64::from(x) + dx, f64::from(y) + dy)) != 0 {
            hits += 1;
        }
    }
    f32::from(hits) / 4.0
}

/// Multiply one premultiplied pixel by a `[0, 1]` weight.
#[inline]
pub(crate) fn scale_px_coverage(px: [u8; 4], coverage: f32) -> [u8; 4] {
    if coverage >= 1.0 {
        return px;
    }
    if coverage <= 0.0 {
        return [0, 0, 0, 0];
    }
    let w = (coverage * 255.0).round() as u16;
    [
        ((u16::from(px[0]) * w + 127) / 255) as u8,
        ((u16::from(px[1]) * w + 127) / 255) as u8,
        ((u16::from(px[2]) * w + 127) / 255) as u8,
        ((u16::from(px[3]) * w + 127) / 255) as u8,
    ]
}

/// Clip a layer to a parametric shape (or its complement when `invert`).
/// Unknown shapes leave the layer untouched.
pub(crate) fn apply_shape_mask(layer: &mut Surface, shape: MaskShape, invert: bool) {
    let Some(path) = shape_path(shape, f64::from(layer.width()), f64::from(layer.height()))
    else {
        return;
    };

    let (w, h) = (layer.width(), layer.height());
    for y in 0..h {
        for x in 0..w {
            let mut coverage = path_coverage(&path, x, y);
            if invert {
                coverage = 1.0 - coverage;
            }
            let px = layer.pixel(x as i32, y as i32);
            layer.set_pixel(x as i32, y as i32, scale_px_coverage(px, coverage));
        }
    }
}

/// Multiply a linear or radial alpha ramp into the layer (destination-in
/// semantics: only the layer's own pixels are attenuated).
pub(crate) fn apply_gradient_mask(layer: &mut Surface, gradient: &GradientMask) {
    let (w, h) = (layer.width(), layer.height());
    let start = gradient.start_opacity.clamp(0.0, 1.0) as f32;
    let end = gradient.end_opacity.clamp(0.0, 1.0) as f32;

    let wf = (w.max(2) - 1) as f32;
    let hf = (h.max(2) - 1) as f32;
    let cx = (w as f32 - 1.0) / 2.0;
    let cy = (h as f32 - 1.0) / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);

    for y in 0..h {
        for x in 0..w {
            let t = match gradient.direction {
                GradientDirection::LeftToRight => x as f32 / wf,
                GradientDirection::RightToLeft => 1.0 - x as f32 / wf,
                GradientDirection::TopToBottom => y as f32 / hf,
                GradientDirection::BottomToTop => 1.0 - y as f32 / hf,
                GradientDirection::Radial => {
                    let dx = x as f32 - cx;
                    let dy = y as f32 - cy;
                    (dx * dx + dy * dy).sqrt() / max_dist
                }
            };
            let alpha = lerp_f32(start, end, t.clamp(0.0, 1.0));
            let px = layer.pixel(x as i32, y as i32);
            layer.set_pixel(x as i32, y as i32, scale_px_coverage(px, alpha));
        }
    }
}

/// Clip the layer to a rounded rectangle and stroke its border afterwards
/// when `width_px > 0`.
pub(crate) fn apply_border(layer: &mut Surface, border: &BorderSettings) {
    let w = f64::from(layer.width());
    let h = f64::from(layer.height());
    let radius = border.corner_radius_px.clamp(0.0, w.min(h) / 2.0);

    if radius > 0.0 {
        let outer = kurbo::RoundedRect::new(0.0, 0.0, w, h, radius).to_path(0.1);
        for y in 0..layer.height() {
            for x in 0..layer.width() {
                let coverage = path_coverage(&outer, x, y);
                let px = layer.pixel(x as i32, y as i32);
                layer.set_pixel(x as i32, y as i32, scale_px_coverage(px, coverage));
            }
        }
    }

    let bw = border.width_px;
    if bw <= 0.0 {
        return;
    }
    let color = border.color.to_rgba8_premul().to_array();
    let outer = kurbo::RoundedRect::new(0.0, 0.0, w, h, radius).to_path(0.1);
    let inner_radius = (radius - bw).max(0.0);
    let inner = kurbo::RoundedRect::new(bw, bw, (w - bw).max(bw), (h - bw).max(bw), inner_radius)
        .to_path(0.1);

    for y in 0..layer.height() {
        for x in 0..layer.width() {
            let ring = path_coverage(&outer, x, y) - path_coverage(&inner, x, y);
            if ring <= 0.0 {
                continue;
            }
            layer.over_pixel(x as i32, y as i32, scale_px_coverage(color, ring));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::color::ColorDef;
    use crate::foundation::core::Rgba8Premul;

    fn white_layer(w: u32, h: u32) -> Surface {
        Surface::filled(
            w,
            h,
            Rgba8Premul {
                r: 255,
                g: 255,
                b: 255,
                a: 255,
            },
        )
        .unwrap()
    }

    #[test]
    fn circle_mask_keeps_center_clears_corners() {
        let mut layer = white_layer(32, 32);
        apply_shape_mask(&mut layer, MaskShape::Circle, false);
        assert_eq!(layer.pixel(16, 16)[3], 255);
        assert_eq!(layer.pixel(0, 0)[3], 0);
    }

    #[test]
    fn inverted_circle_is_the_complement() {
        let mut layer = white_layer(32, 32);
        apply_shape_mask(&mut layer, MaskShape::Circle, true);
        assert_eq!(layer.pixel(16, 16)[3], 0);
        assert_eq!(layer.pixel(0, 0)[3], 255);
    }

    #[test]
    fn unknown_shape_is_a_noop() {
        let mut layer = white_layer(16, 16);
        let before = layer.clone();
        apply_shape_mask(&mut layer, MaskShape::Unknown, false);
        assert_eq!(layer, before);
    }

    #[test]
    fn star_and_heart_cover_center_not_top_corners() {
        for shape in [MaskShape::Star, MaskShape::Heart, MaskShape::Pentagon] {
            let mut layer = white_layer(64, 64);
            apply_shape_mask(&mut layer, shape, false);
            assert!(layer.pixel(32, 32)[3] > 0, "{shape:?} center");
            assert_eq!(layer.pixel(0, 0)[3], 0, "{shape:?} corner");
        }
    }

    #[test]
    fn gradient_top_to_bottom_fades_alpha() {
        let mut layer = white_layer(4, 16);
        apply_gradient_mask(
            &mut layer,
            &GradientMask {
                direction: GradientDirection::TopToBottom,
                start_opacity: 1.0,
                end_opacity: 0.0,
            },
        );
        assert_eq!(layer.pixel(0, 0)[3], 255);
        assert_eq!(layer.pixel(0, 15)[3], 0);
        let mid = layer.pixel(0, 8)[3];
        assert!(mid > 0 && mid < 255);
    }

    #[test]
    fn border_stroke_colors_the_edge() {
        let mut layer = white_layer(20, 20);
        apply_border(
            &mut layer,
            &BorderSettings {
                width_px: 3.0,
                color: ColorDef::BLACK,
                corner_radius_px: 0.0,
            },
        );
        // Edge pixels take the border color, interior stays white.
        assert_eq!(&layer.pixel(0, 10)[0..3], &[0, 0, 0]);
        assert_eq!(&layer.pixel(10, 10)[0..3], &[255, 255, 255]);
    }
}
