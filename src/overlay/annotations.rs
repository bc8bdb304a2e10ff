use crate::{
    foundation::error::{MosaiqError, MosaiqResult},
    render::surface::{Surface, composite_over},
    scene::model::{BlendMode, DrawingStroke, PointDef, StrokeTool},
};

/// Draw all annotation strokes in scene order.
///
/// Each stroke rasterizes into its own coverage layer (so self-overlapping
/// segments never double-darken) and is composited once at the stroke's
/// effective opacity. The highlighter hard rule applies here: effective
/// `opacity * 0.4` and `size * 1.5` regardless of the stored values.
pub fn draw_strokes(dst: &mut Surface, strokes: &[DrawingStroke]) -> MosaiqResult<()> {
    for stroke in strokes {
        draw_stroke(dst, stroke)?;
    }
    Ok(())
}

fn effective_params(stroke: &DrawingStroke) -> (f64, f64) {
    match stroke.tool {
        StrokeTool::Highlighter => (stroke.size * 1.5, stroke.opacity * 0.4),
        _ => (stroke.size, stroke.opacity),
    }
}

fn draw_stroke(dst: &mut Surface, stroke: &DrawingStroke) -> MosaiqResult<()> {
    let (size, opacity) = effective_params(stroke);
    let half = (size / 2.0).max(0.5);
    let color = stroke.color.to_rgba8_premul().to_array();

    let mut layer = Surface::new(dst.width(), dst.height())?;

    match stroke.tool {
        StrokeTool::Pen | StrokeTool::Highlighter => {
            for pair in stroke.points.windows(2) {
                stamp_segment(&mut layer, pair[0], pair[1], half, color);
            }
        }
        StrokeTool::Line => {
            let (a, b) = two_point(stroke)?;
            stamp_segment(&mut layer, a, b, half, color);
        }
        StrokeTool::Arrow => {
            let (a, b) = two_point(stroke)?;
            stamp_segment(&mut layer, a, b, half, color);
            let angle = (b.y - a.y).atan2(b.x - a.x);
            let head_len = (size * 3.0).max(10.0);
            for side in [-1.0, 1.0] {
                let theta = angle + side * (std::f64::consts::PI - std::f64::consts::FRAC_PI_6);
                let tip = PointDef {
                    x: b.x + head_len * theta.cos(),
                    y: b.y + head_len * theta.sin(),
                };
                stamp_segment(&mut layer, b, tip, half, color);
            }
        }
        StrokeTool::Rectangle => {
            let (a, b) = two_point(stroke)?;
            let corners = [
                PointDef { x: a.x, y: a.y },
                PointDef { x: b.x, y: a.y },
                PointDef { x: b.x, y: b.y },
                PointDef { x: a.x, y: b.y },
            ];
            for i in 0..4 {
                stamp_segment(&mut layer, corners[i], corners[(i + 1) % 4], half, color);
            }
        }
        StrokeTool::Circle => {
            let (a, b) = two_point(stroke)?;
            let cx = (a.x + b.x) / 2.0;
            let cy = (a.y + b.y) / 2.0;
            let rx = ((b.x - a.x) / 2.0).abs().max(0.5);
            let ry = ((b.y - a.y) / 2.0).abs().max(0.5);
            const STEPS: usize = 72;
            let mut prev = PointDef {
                x: cx + rx,
                y: cy,
            };
            for i in 1..=STEPS {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (STEPS as f64);
                let next = PointDef {
                    x: cx + rx * t.cos(),
                    y: cy + ry * t.sin(),
                };
                stamp_segment(&mut layer, prev, next, half, color);
                prev = next;
            }
        }
    }

    composite_over(dst, &layer, opacity.clamp(0.0, 1.0) as f32, BlendMode::Normal)
}

fn two_point(stroke: &DrawingStroke) -> MosaiqResult<(PointDef, PointDef)> {
    match (stroke.start, stroke.end) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(MosaiqError::render(format!(
            "stroke '{}' is missing start/end geometry",
            stroke.id
        ))),
    }
}

/// Rasterize one thick segment into the coverage layer using the distance to
/// the segment; overlapping stamps keep the maximum coverage.
fn stamp_segment(layer: &mut Surface, a: PointDef, b: PointDef, half: f64, color: [u8; 4]) {
    let x_min = ((a.x.min(b.x) - half).floor() as i32).max(0);
    let x_max = ((a.x.max(b.x) + half).ceil() as i32).min(layer.width() as i32 - 1);
    let y_min = ((a.y.min(b.y) - half).floor() as i32).max(0);
    let y_max = ((a.y.max(b.y) + half).ceil() as i32).min(layer.height() as i32 - 1);

    let seg_x = b.x - a.x;
    let seg_y = b.y - a.y;
    let len_sq = seg_x * seg_x + seg_y * seg_y;

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            let t = if len_sq <= f64::EPSILON {
                0.0
            } else {
                (((px - a.x) * seg_x + (py - a.y) * seg_y) / len_sq).clamp(0.0, 1.0)
            };
            let dx = px - (a.x + seg_x * t);
            let dy = py - (a.y + seg_y * t);
            let dist = (dx * dx + dy * dy).sqrt();
            let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let w = (coverage * 255.0).round() as u16;
            let stamped = [
                ((u16::from(color[0]) * w + 127) / 255) as u8,
                ((u16::from(color[1]) * w + 127) / 255) as u8,
                ((u16::from(color[2]) * w + 127) / 255) as u8,
                ((u16::from(color[3]) * w + 127) / 255) as u8,
            ];
            if stamped[3] > layer.pixel(x, y)[3] {
                layer.set_pixel(x, y, stamped);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::color::ColorDef;

    fn stroke(tool: StrokeTool) -> DrawingStroke {
        DrawingStroke {
            id: "s".to_string(),
            tool,
            color: ColorDef::BLACK,
            size: 10.0,
            opacity: 1.0,
            points: vec![
                PointDef { x: 5.0, y: 20.0 },
                PointDef { x: 35.0, y: 20.0 },
            ],
            start: Some(PointDef { x: 5.0, y: 20.0 }),
            end: Some(PointDef { x: 35.0, y: 20.0 }),
        }
    }

    #[test]
    fn highlighter_override_is_hard_coded() {
        let mut s = stroke(StrokeTool::Highlighter);
        s.size = 10.0;
        s.opacity = 1.0;
        assert_eq!(effective_params(&s), (15.0, 0.4));

        let pen = stroke(StrokeTool::Pen);
        assert_eq!(effective_params(&pen), (10.0, 1.0));
    }

    #[test]
    fn highlighter_renders_wider_and_fainter_than_pen() {
        let mut pen_canvas = Surface::new(40, 40).unwrap();
        draw_strokes(&mut pen_canvas, &[stroke(StrokeTool::Pen)]).unwrap();

        let mut hl_canvas = Surface::new(40, 40).unwrap();
        draw_strokes(&mut hl_canvas, &[stroke(StrokeTool::Highlighter)]).unwrap();

        // On the center line the pen is opaque, the highlighter ~40%.
        assert_eq!(pen_canvas.pixel(20, 20)[3], 255);
        let hl_alpha = hl_canvas.pixel(20, 20)[3];
        assert!((i32::from(hl_alpha) - 102).abs() <= 2, "alpha {hl_alpha}");

        // 7.5px half-width covers y=27; the 5px pen does not.
        assert_eq!(pen_canvas.pixel(20, 27)[3], 0);
        assert!(hl_canvas.pixel(20, 26)[3] > 0);
    }

    #[test]
    fn rectangle_outlines_without_filling() {
        let mut canvas = Surface::new(60, 60).unwrap();
        let mut s = stroke(StrokeTool::Rectangle);
        s.size = 2.0;
        s.start = Some(PointDef { x: 10.0, y: 10.0 });
        s.end = Some(PointDef { x: 50.0, y: 50.0 });
        draw_strokes(&mut canvas, &[s]).unwrap();
        assert!(canvas.pixel(10, 30)[3] > 0);
        assert_eq!(canvas.pixel(30, 30)[3], 0);
    }

    #[test]
    fn arrow_adds_head_segments() {
        let mut line_canvas = Surface::new(60, 60).unwrap();
        let mut arrow_canvas = Surface::new(60, 60).unwrap();
        let mut s = stroke(StrokeTool::Line);
        s.size = 4.0;
        s.start = Some(PointDef { x: 10.0, y: 30.0 });
        s.end = Some(PointDef { x: 50.0, y: 30.0 });
        draw_strokes(&mut line_canvas, &[s.clone()]).unwrap();
        s.tool = StrokeTool::Arrow;
        draw_strokes(&mut arrow_canvas, &[s]).unwrap();

        let line_ink: u32 = line_canvas.data().chunks_exact(4).map(|p| u32::from(p[3])).sum();
        let arrow_ink: u32 = arrow_canvas
            .data()
            .chunks_exact(4)
            .map(|p| u32::from(p[3]))
            .sum();
        assert!(arrow_ink > line_ink);
    }

    #[test]
    fn missing_two_point_geometry_errors() {
        let mut canvas = Surface::new(20, 20).unwrap();
        let mut s = stroke(StrokeTool::Line);
        s.start = None;
        assert!(draw_strokes(&mut canvas, &[s]).is_err());
    }
}
