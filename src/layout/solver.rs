use std::f64::consts::PI;

use crate::{
    foundation::core::{Canvas, Rect, aspect_fit},
    foundation::error::{MosaiqError, MosaiqResult},
    scene::model::LayoutKind,
};

/// One image placement computed by the layout solver.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    /// Placement rectangle in canvas pixel space.
    pub rect: Rect,
    /// Rotation about the rectangle center, degrees clockwise.
    pub rotation_deg: f64,
    /// How the image is scaled into `rect`.
    pub fit: SlotFit,
    /// Polaroid frame decoration (stacked layout only).
    pub frame: Option<PolaroidFrame>,
}

/// Scaling policy for an image inside its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotFit {
    /// Letterbox: the whole image is visible inside the slot.
    Contain,
    /// Fill: the slot is fully covered, overflow cropped.
    Cover,
}

/// White frame drawn behind a stacked-layout image; the image is letterboxed
/// into `inset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolaroidFrame {
    /// Image area inside the frame, canvas pixel space.
    pub inset: Rect,
}

impl Slot {
    fn plain(rect: Rect, fit: SlotFit) -> Self {
        Self {
            rect,
            rotation_deg: 0.0,
            fit,
            frame: None,
        }
    }
}

/// Normalized `(x, y, w, h, rotation_deg)` lookup tables for the fixed
/// collage layouts. At most 8 images are placed; extras are dropped.
type TableEntry = (f64, f64, f64, f64, f64);

const MOSAIC_TABLE: [TableEntry; 8] = [
    (0.00, 0.00, 0.50, 0.50, 0.0),
    (0.50, 0.00, 0.50, 0.25, 0.0),
    (0.50, 0.25, 0.50, 0.25, 0.0),
    (0.00, 0.50, 0.25, 0.50, 0.0),
    (0.25, 0.50, 0.25, 0.50, 0.0),
    (0.50, 0.50, 0.50, 0.30, 0.0),
    (0.50, 0.80, 0.25, 0.20, 0.0),
    (0.75, 0.80, 0.25, 0.20, 0.0),
];

const COLLAGE1_TABLE: [TableEntry; 8] = [
    (0.05, 0.05, 0.40, 0.40, -6.0),
    (0.52, 0.08, 0.38, 0.36, 4.0),
    (0.08, 0.52, 0.36, 0.38, 3.0),
    (0.54, 0.50, 0.38, 0.40, -4.0),
    (0.30, 0.28, 0.40, 0.40, 8.0),
    (0.02, 0.30, 0.30, 0.30, -8.0),
    (0.64, 0.27, 0.30, 0.28, 6.0),
    (0.33, 0.64, 0.34, 0.30, -3.0),
];

const COLLAGE2_TABLE: [TableEntry; 8] = [
    (0.00, 0.00, 0.58, 0.66, 0.0),
    (0.60, 0.00, 0.40, 0.32, 0.0),
    (0.60, 0.34, 0.40, 0.32, 0.0),
    (0.00, 0.68, 0.32, 0.32, 0.0),
    (0.34, 0.68, 0.32, 0.32, 0.0),
    (0.68, 0.68, 0.32, 0.32, 0.0),
    (0.36, 0.36, 0.30, 0.30, 0.0),
    (0.08, 0.34, 0.26, 0.30, 0.0),
];

const OVERLAY_TABLE: [TableEntry; 8] = [
    (0.00, 0.00, 1.00, 1.00, 0.0),
    (0.06, 0.06, 0.28, 0.28, 0.0),
    (0.66, 0.06, 0.28, 0.28, 0.0),
    (0.06, 0.66, 0.28, 0.28, 0.0),
    (0.66, 0.66, 0.28, 0.28, 0.0),
    (0.36, 0.06, 0.28, 0.28, 0.0),
    (0.36, 0.66, 0.28, 0.28, 0.0),
    (0.06, 0.36, 0.28, 0.28, 0.0),
];

/// Compute one placement slot per image for `layout`.
///
/// `image_sizes` carries the natural pixel dimensions of the source images in
/// scene order; only [`LayoutKind::Single`] reads them (aspect fit), the
/// other layouts place cells and defer scaling to the draw stage.
///
/// Layouts with a minimum image count reject under-populated scenes with a
/// [`MosaiqError::Layout`] instead of drawing garbage. Fixed-table layouts
/// return `min(n, 8)` slots, silently dropping the rest.
pub fn compute_layout(
    layout: LayoutKind,
    canvas: Canvas,
    image_sizes: &[(u32, u32)],
    margin: f64,
) -> MosaiqResult<Vec<Slot>> {
    let n = image_sizes.len();
    if n == 0 {
        return Err(MosaiqError::layout("layout requires >= 1 image"));
    }
    if !margin.is_finite() || margin < 0.0 {
        return Err(MosaiqError::layout("margin must be finite and >= 0"));
    }
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let min_dim = canvas.min_dim();

    match layout {
        LayoutKind::Single | LayoutKind::Unknown => {
            let (iw, ih) = image_sizes[0];
            let outer = Rect::new(margin, margin, w - margin, h - margin);
            if outer.width() <= 0.0 || outer.height() <= 0.0 {
                return Err(MosaiqError::layout("margin leaves no drawable area"));
            }
            let rect = aspect_fit(f64::from(iw), f64::from(ih), outer);
            Ok(vec![Slot::plain(rect, SlotFit::Contain)])
        }
        LayoutKind::Horizontal => {
            let cell_w = (w - margin * (n as f64 + 1.0)) / n as f64;
            let cell_h = h - 2.0 * margin;
            if cell_w <= 0.0 || cell_h <= 0.0 {
                return Err(MosaiqError::layout("margin leaves no drawable cells"));
            }
            Ok((0..n)
                .map(|i| {
                    let x = margin + i as f64 * (cell_w + margin);
                    Slot::plain(
                        Rect::new(x, margin, x + cell_w, margin + cell_h),
                        SlotFit::Contain,
                    )
                })
                .collect())
        }
        LayoutKind::Vertical => {
            let cell_w = w - 2.0 * margin;
            let cell_h = (h - margin * (n as f64 + 1.0)) / n as f64;
            if cell_w <= 0.0 || cell_h <= 0.0 {
                return Err(MosaiqError::layout("margin leaves no drawable cells"));
            }
            Ok((0..n)
                .map(|i| {
                    let y = margin + i as f64 * (cell_h + margin);
                    Slot::plain(
                        Rect::new(margin, y, margin + cell_w, y + cell_h),
                        SlotFit::Contain,
                    )
                })
                .collect())
        }
        LayoutKind::Grid => {
            require_min(n, 2, "grid")?;
            let cols = grid_columns(n);
            let rows = n.div_ceil(cols);
            let cell_w = (w - margin * (cols as f64 + 1.0)) / cols as f64;
            let cell_h = (h - margin * (rows as f64 + 1.0)) / rows as f64;
            if cell_w <= 0.0 || cell_h <= 0.0 {
                return Err(MosaiqError::layout("margin leaves no drawable cells"));
            }
            Ok((0..n)
                .map(|i| {
                    let col = (i % cols) as f64;
                    let row = (i / cols) as f64;
                    let x = margin + col * (cell_w + margin);
                    let y = margin + row * (cell_h + margin);
                    Slot::plain(Rect::new(x, y, x + cell_w, y + cell_h), SlotFit::Contain)
                })
                .collect())
        }
        LayoutKind::Diagonal => {
            require_min(n, 2, "diagonal")?;
            let size = 0.35 * min_dim;
            let step = (min_dim - size) / n as f64;
            let span = size + (n as f64 - 1.0) * step;
            let x0 = (w - span) / 2.0;
            let y0 = (h - span) / 2.0;
            Ok((0..n)
                .map(|i| {
                    let x = x0 + i as f64 * step;
                    let y = y0 + i as f64 * step;
                    Slot::plain(Rect::new(x, y, x + size, y + size), SlotFit::Cover)
                })
                .collect())
        }
        LayoutKind::Circular => {
            require_min(n, 3, "circular")?;
            let radius = 0.30 * min_dim;
            let tile = 0.25 * min_dim;
            Ok((0..n)
                .map(|i| {
                    let angle = 2.0 * PI * i as f64 / n as f64 - PI / 2.0;
                    let cx = w / 2.0 + radius * angle.cos();
                    let cy = h / 2.0 + radius * angle.sin();
                    Slot::plain(
                        Rect::new(
                            cx - tile / 2.0,
                            cy - tile / 2.0,
                            cx + tile / 2.0,
                            cy + tile / 2.0,
                        ),
                        SlotFit::Cover,
                    )
                })
                .collect())
        }
        LayoutKind::Stacked => {
            require_min(n, 2, "stacked")?;
            let frame_w = 0.5 * min_dim;
            let frame_h = frame_w * 1.1;
            Ok((0..n)
                .map(|i| {
                    // Integer division: for N=3 this fans -12/0/+12 degrees.
                    let k = i as f64 - (n / 2) as f64;
                    let cx = w / 2.0 + k * 15.0;
                    let cy = h / 2.0 + k * 10.0;
                    let rect = Rect::new(
                        cx - frame_w / 2.0,
                        cy - frame_h / 2.0,
                        cx + frame_w / 2.0,
                        cy + frame_h / 2.0,
                    );
                    let inset = Rect::new(
                        rect.x0 + 0.075 * frame_w,
                        rect.y0 + 0.075 * frame_h,
                        rect.x0 + 0.925 * frame_w,
                        rect.y0 + 0.825 * frame_h,
                    );
                    Slot {
                        rect,
                        rotation_deg: k * 12.0,
                        fit: SlotFit::Contain,
                        frame: Some(PolaroidFrame { inset }),
                    }
                })
                .collect())
        }
        LayoutKind::Mosaic => Ok(table_slots(&MOSAIC_TABLE, n, w, h)),
        LayoutKind::Collage1 => Ok(table_slots(&COLLAGE1_TABLE, n, w, h)),
        LayoutKind::Collage2 => Ok(table_slots(&COLLAGE2_TABLE, n, w, h)),
        LayoutKind::Overlay => Ok(table_slots(&OVERLAY_TABLE, n, w, h)),
    }
}

/// Column count for the grid layout, derived from image count.
fn grid_columns(n: usize) -> usize {
    match n {
        0..=2 => n.max(1),
        3..=4 => 2,
        5..=6 => 3,
        _ => (n as f64).sqrt().ceil() as usize,
    }
}

fn require_min(n: usize, min: usize, name: &str) -> MosaiqResult<()> {
    if n < min {
        return Err(MosaiqError::layout(format!(
            "{name} layout requires at least {min} images (got {n})"
        )));
    }
    Ok(())
}

fn table_slots(table: &[TableEntry; 8], n: usize, w: f64, h: f64) -> Vec<Slot> {
    table
        .iter()
        .take(n.min(8))
        .map(|&(x, y, tw, th, rot)| Slot {
            rect: Rect::new(x * w, y * h, (x + tw) * w, (y + th) * h),
            rotation_deg: rot,
            fit: SlotFit::Cover,
            frame: None,
        })
        .collect()
}
