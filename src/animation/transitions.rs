use crate::{
    animation::ease::Ease,
    foundation::error::{MosaiqError, MosaiqResult},
    foundation::math::hash_px,
    render::surface::{Surface, crossfade_px, premul_over_px},
};

/// Slideshow transition between two frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransitionKind {
    /// Alpha cross-dissolve.
    Fade,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    /// Incoming frame scales 1.2 -> 1 with a cross-fade.
    ZoomIn,
    /// Incoming frame scales 0.8 -> 1 with a cross-fade.
    ZoomOut,
    /// Per-pixel seeded threshold dissolve.
    Dissolve,
    /// Hard switch at the eased midpoint.
    Cut,
}

/// Parse a transition name; accepts snake/kebab/concatenated spellings.
pub fn parse_transition(kind: &str) -> MosaiqResult<TransitionKind> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(MosaiqError::validation("transition kind must be non-empty"));
    }
    match kind.as_str() {
        "fade" | "crossfade" => Ok(TransitionKind::Fade),
        "slide_left" | "slide-left" | "slideleft" => Ok(TransitionKind::SlideLeft),
        "slide_right" | "slide-right" | "slideright" => Ok(TransitionKind::SlideRight),
        "slide_up" | "slide-up" | "slideup" => Ok(TransitionKind::SlideUp),
        "slide_down" | "slide-down" | "slidedown" => Ok(TransitionKind::SlideDown),
        "zoom_in" | "zoom-in" | "zoomin" => Ok(TransitionKind::ZoomIn),
        "zoom_out" | "zoom-out" | "zoomout" => Ok(TransitionKind::ZoomOut),
        "dissolve" => Ok(TransitionKind::Dissolve),
        "cut" | "none" => Ok(TransitionKind::Cut),
        _ => Err(MosaiqError::validation(format!(
            "unknown transition kind '{kind}'"
        ))),
    }
}

/// Compute the in-between frame for a transition at `progress` in `[0, 1]`.
///
/// Progress is eased with [`Ease::InOutCubic`] before the per-kind geometry
/// or alpha math. Boundary law: progress 0 returns `from` exactly,
/// progress 1 returns `to` exactly. `seed` drives the dissolve pattern and
/// has no effect on the other kinds.
pub fn render_transition_frame(
    from: &Surface,
    to: &Surface,
    kind: TransitionKind,
    progress: f64,
    seed: u64,
) -> MosaiqResult<Surface> {
    if from.width() != to.width() || from.height() != to.height() {
        return Err(MosaiqError::render(
            "transition frames must have equal dimensions",
        ));
    }
    let t = Ease::InOutCubic.apply(progress.clamp(0.0, 1.0)) as f32;
    let (w, h) = (from.width(), from.height());

    match kind {
        TransitionKind::Fade => {
            let mut out = Surface::new(w, h)?;
            for y in 0..h as i32 {
                for x in 0..w as i32 {
                    out.set_pixel(x, y, crossfade_px(from.pixel(x, y), to.pixel(x, y), t));
                }
            }
            Ok(out)
        }
        TransitionKind::SlideLeft => slide(from, to, t, (-1.0, 0.0)),
        TransitionKind::SlideRight => slide(from, to, t, (1.0, 0.0)),
        TransitionKind::SlideUp => slide(from, to, t, (0.0, -1.0)),
        TransitionKind::SlideDown => slide(from, to, t, (0.0, 1.0)),
        TransitionKind::ZoomIn => zoom(from, to, t, 1.2),
        TransitionKind::ZoomOut => zoom(from, to, t, 0.8),
        TransitionKind::Dissolve => {
            let mut out = Surface::new(w, h)?;
            let threshold = f64::from(t);
            for y in 0..h {
                for x in 0..w {
                    let r = f64::from(hash_px(seed, x, y)) / (f64::from(u32::MAX) + 1.0);
                    let px = if r < threshold {
                        to.pixel(x as i32, y as i32)
                    } else {
                        from.pixel(x as i32, y as i32)
                    };
                    out.set_pixel(x as i32, y as i32, px);
                }
            }
            Ok(out)
        }
        TransitionKind::Cut => {
            if t < 0.5 {
                Ok(from.clone())
            } else {
                Ok(to.clone())
            }
        }
    }
}

/// Push slide: both frames translate in opposite directions along `dir` by
/// the canvas dimension times progress.
fn slide(from: &Surface, to: &Surface, t: f32, dir: (f32, f32)) -> MosaiqResult<Surface> {
    let (w, h) = (from.width(), from.height());
    let wf = w as f32;
    let hf = h as f32;

    let from_dx = dir.0 * t * wf;
    let from_dy = dir.1 * t * hf;
    let to_dx = -dir.0 * (1.0 - t) * wf;
    let to_dy = -dir.1 * (1.0 - t) * hf;

    let mut out = Surface::new(w, h)?;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let xf = x as f32;
            let yf = y as f32;
            let fp = from.pixel(
                (xf - from_dx).round() as i32,
                (yf - from_dy).round() as i32,
            );
            let tp = to.pixel((xf - to_dx).round() as i32, (yf - to_dy).round() as i32);
            out.set_pixel(x, y, premul_over_px(fp, tp));
        }
    }
    Ok(out)
}

/// Scale the incoming frame about the canvas center from `from_scale` to 1
/// while cross-fading.
fn zoom(from: &Surface, to: &Surface, t: f32, from_scale: f32) -> MosaiqResult<Surface> {
    let (w, h) = (from.width(), from.height());
    let s = (from_scale + (1.0 - from_scale) * t).max(1e-6);
    let ox = w as f32 / 2.0;
    let oy = h as f32 / 2.0;

    let mut out = Surface::new(w, h)?;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let bx = ox + (x as f32 - ox) / s;
            let by = oy + (y as f32 - oy) / s;
            let tp = to.pixel(bx.round() as i32, by.round() as i32);
            let fp = from.pixel(x, y);
            out.set_pixel(x, y, crossfade_px(fp, tp, t));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> Surface {
        let mut s = Surface::new(w, h).unwrap();
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                s.set_pixel(x, y, px);
            }
        }
        s
    }

    const ALL_KINDS: [TransitionKind; 9] = [
        TransitionKind::Fade,
        TransitionKind::SlideLeft,
        TransitionKind::SlideRight,
        TransitionKind::SlideUp,
        TransitionKind::SlideDown,
        TransitionKind::ZoomIn,
        TransitionKind::ZoomOut,
        TransitionKind::Dissolve,
        TransitionKind::Cut,
    ];

    #[test]
    fn boundary_law_holds_for_every_kind() {
        let from = solid(12, 10, [255, 0, 0, 255]);
        let to = solid(12, 10, [0, 0, 255, 255]);
        for kind in ALL_KINDS {
            let start = render_transition_frame(&from, &to, kind, 0.0, 7).unwrap();
            assert_eq!(start, from, "{kind:?} at progress 0");
            let end = render_transition_frame(&from, &to, kind, 1.0, 7).unwrap();
            assert_eq!(end, to, "{kind:?} at progress 1");
        }
    }

    #[test]
    fn fade_midpoint_mixes_colors() {
        let from = solid(4, 4, [200, 0, 0, 255]);
        let to = solid(4, 4, [0, 0, 200, 255]);
        let mid = render_transition_frame(&from, &to, TransitionKind::Fade, 0.5, 0).unwrap();
        let px = mid.pixel(2, 2);
        assert!(px[0] > 0 && px[0] < 200);
        assert!(px[2] > 0 && px[2] < 200);
    }

    #[test]
    fn slide_left_shows_incoming_on_the_right() {
        let from = solid(20, 10, [255, 0, 0, 255]);
        let to = solid(20, 10, [0, 255, 0, 255]);
        let mid =
            render_transition_frame(&from, &to, TransitionKind::SlideLeft, 0.5, 0).unwrap();
        // Eased midpoint is 0.5: left half outgoing, right half incoming.
        assert_eq!(mid.pixel(2, 5)[0], 255);
        assert_eq!(mid.pixel(17, 5)[1], 255);
    }

    #[test]
    fn dissolve_is_deterministic_and_mixed_at_midpoint() {
        let from = solid(32, 32, [255, 0, 0, 255]);
        let to = solid(32, 32, [0, 0, 255, 255]);
        let a = render_transition_frame(&from, &to, TransitionKind::Dissolve, 0.5, 9).unwrap();
        let b = render_transition_frame(&from, &to, TransitionKind::Dissolve, 0.5, 9).unwrap();
        assert_eq!(a, b);

        let from_px = a
            .data()
            .chunks_exact(4)
            .filter(|px| px[0] == 255)
            .count();
        assert!(from_px > 0 && from_px < 32 * 32);
    }

    #[test]
    fn parse_accepts_aliases_and_rejects_unknown() {
        assert_eq!(parse_transition("crossfade").unwrap(), TransitionKind::Fade);
        assert_eq!(
            parse_transition("slide-left").unwrap(),
            TransitionKind::SlideLeft
        );
        assert_eq!(parse_transition("ZOOM_IN").unwrap(), TransitionKind::ZoomIn);
        assert!(parse_transition("wormhole").is_err());
        assert!(parse_transition("").is_err());
    }
}
