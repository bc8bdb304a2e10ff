use std::collections::BTreeMap;

use crate::{
    assets::color::ColorDef,
    foundation::core::Canvas,
    foundation::error::{MosaiqError, MosaiqResult},
};

/// A complete collage scene.
///
/// A scene is a pure data model that can be:
/// - built programmatically
/// - serialized/deserialized via Serde (JSON)
///
/// Rendering a scene is performed by [`crate::render_scene`]; every render
/// call takes the scene as an immutable snapshot and the renderer retains
/// nothing between calls.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Output canvas dimensions.
    pub canvas: Canvas,
    /// Background fill color.
    #[serde(default = "default_background")]
    pub background: ColorDef,
    /// Layout algorithm placing the images.
    pub layout: LayoutKind,
    /// Uniform margin in pixels used by the layout.
    #[serde(default = "default_margin")]
    pub margin: f64,
    /// Ordered source images; the index is the image's identity.
    pub images: Vec<ImageRef>,
    /// Sparse per-image settings keyed by image index; absent entries use defaults.
    #[serde(default)]
    pub image_settings: BTreeMap<usize, ImageSettings>,
    /// Global filter chain applied to every image draw.
    #[serde(default)]
    pub filters: FilterSettings,
    /// Global blend mode applied to every image draw.
    #[serde(default)]
    pub blend: BlendMode,
    /// Text layers (split into behind/front groups at render time).
    #[serde(default)]
    pub texts: Vec<TextLayer>,
    /// Sticker layers, rendered sorted by `z_index` ascending.
    #[serde(default)]
    pub stickers: Vec<StickerLayer>,
    /// Freehand annotation strokes.
    #[serde(default)]
    pub strokes: Vec<DrawingStroke>,
    /// Whole-canvas post-processing stack.
    #[serde(default)]
    pub effects: EffectStack,
    /// Deterministic seed driving dissolve/glitch noise.
    #[serde(default)]
    pub seed: u64,
}

fn default_background() -> ColorDef {
    ColorDef::WHITE
}

fn default_margin() -> f64 {
    20.0
}

/// Reference to a source bitmap, resolved by the asset store before render.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageRef {
    /// Relative path to the image file.
    pub source: String,
}

/// Layout algorithm identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LayoutKind {
    /// One image, aspect-fit and centered.
    #[default]
    Single,
    /// Equal cells along the horizontal axis.
    Horizontal,
    /// Equal cells along the vertical axis.
    Vertical,
    /// Uniform grid; column count derived from image count.
    Grid,
    /// Fixed-size squares stepping diagonally.
    Diagonal,
    /// Square tiles evenly spaced on a circle.
    Circular,
    /// Fanned polaroid frames.
    Stacked,
    /// Fixed 8-slot patchwork table.
    Mosaic,
    /// Fixed 8-slot scattered table with per-slot rotation.
    Collage1,
    /// Fixed 8-slot table, first image large-left.
    Collage2,
    /// First image full-canvas, the rest tiled on top.
    Overlay,
    /// Forward-compatibility fallback; renders as [`LayoutKind::Single`].
    #[serde(other)]
    Unknown,
}

/// Per-image render settings. Every field has a neutral default.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageSettings {
    /// Rotation/flip applied inside the slot.
    #[serde(default)]
    pub transform: ImageTransform,
    /// Crop rectangle in percentages of the source bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
    /// Shape/gradient alpha mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskSettings>,
    /// Rounded-rect clip and stroked border.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderSettings>,
    /// Per-image opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            transform: ImageTransform::default(),
            crop: None,
            mask: None,
            border: None,
            opacity: 1.0,
        }
    }
}

/// Rotation and mirroring for one image.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageTransform {
    /// Clockwise rotation in degrees about the slot center.
    #[serde(default)]
    pub rotation_deg: f64,
    /// Mirror horizontally.
    #[serde(default)]
    pub flip_h: bool,
    /// Mirror vertically.
    #[serde(default)]
    pub flip_v: bool,
}

/// Crop rectangle in percent of the source image; `width`/`height` are
/// measured from `x`/`y`. Validated, never clamped.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Full-image crop; rendering with it is pixel-identical to no crop.
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

/// Shape/gradient alpha mask settings for one image.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MaskSettings {
    /// Parametric mask shape.
    #[serde(default)]
    pub shape: MaskShape,
    /// Clip to the complement of the shape instead.
    #[serde(default)]
    pub invert: bool,
    /// Optional gradient alpha ramp multiplied on top of the shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientMask>,
}

/// Parametric mask shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MaskShape {
    #[default]
    Circle,
    Square,
    Heart,
    Star,
    Pentagon,
    Hexagon,
    /// Forward-compatibility fallback; renders as "no mask".
    #[serde(other)]
    Unknown,
}

/// Linear or radial alpha ramp across an image slot.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GradientMask {
    /// Ramp direction.
    #[serde(default)]
    pub direction: GradientDirection,
    /// Alpha multiplier at the ramp start, `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub start_opacity: f64,
    /// Alpha multiplier at the ramp end, `[0, 1]`.
    #[serde(default)]
    pub end_opacity: f64,
}

/// Gradient ramp direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GradientDirection {
    LeftToRight,
    RightToLeft,
    #[default]
    TopToBottom,
    BottomToTop,
    /// Ramp from the slot center outward.
    Radial,
}

/// Rounded-rect clip and border stroke for one image.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct BorderSettings {
    /// Border stroke width in pixels; `0` clips without stroking.
    #[serde(default)]
    pub width_px: f64,
    /// Border stroke color.
    #[serde(default = "default_border_color")]
    pub color: ColorDef,
    /// Corner radius of the clip in pixels.
    #[serde(default)]
    pub corner_radius_px: f64,
}

fn default_border_color() -> ColorDef {
    ColorDef::WHITE
}

/// Global filter chain. All channels default to neutral; application order is
/// brightness -> contrast -> saturate -> blur -> hue-rotate -> grayscale ->
/// sepia -> invert and must not be reordered.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterSettings {
    /// Brightness percent, `0..=200`, 100 = neutral.
    #[serde(default = "default_hundred")]
    pub brightness: f64,
    /// Contrast percent, `0..=200`, 100 = neutral.
    #[serde(default = "default_hundred")]
    pub contrast: f64,
    /// Saturation percent, `0..=200`, 100 = neutral.
    #[serde(default = "default_hundred")]
    pub saturation: f64,
    /// Gaussian blur radius in pixels, `0..=20`.
    #[serde(default)]
    pub blur_px: f64,
    /// Hue rotation in degrees, `0..=360`.
    #[serde(default)]
    pub hue_rotate_deg: f64,
    /// Grayscale amount percent, `0..=100`.
    #[serde(default)]
    pub grayscale: f64,
    /// Sepia amount percent, `0..=100`.
    #[serde(default)]
    pub sepia: f64,
    /// Invert amount percent, `0..=100`.
    #[serde(default)]
    pub invert: f64,
}

fn default_hundred() -> f64 {
    100.0
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur_px: 0.0,
            hue_rotate_deg: 0.0,
            grayscale: 0.0,
            sepia: 0.0,
            invert: 0.0,
        }
    }
}

impl FilterSettings {
    /// True when every channel is at its neutral value.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Blend mode used when compositing a layer (premultiplied alpha).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BlendMode {
    /// Standard "source over destination".
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    SoftLight,
    HardLight,
    /// Extended set used by double exposure.
    Difference,
    /// Extended set used by double exposure.
    Exclusion,
}

/// A text layer positioned by canvas percentage.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    /// Layer identifier (stable within a scene).
    pub id: String,
    /// UTF-8 text content.
    pub text: String,
    /// Horizontal anchor in percent of canvas width.
    #[serde(default = "default_fifty")]
    pub x_pct: f64,
    /// Vertical anchor in percent of canvas height.
    #[serde(default = "default_fifty")]
    pub y_pct: f64,
    /// Font size in pixels.
    #[serde(default = "default_text_size")]
    pub size_px: f32,
    /// Relative path to the font file.
    pub font_source: String,
    /// Fill color.
    #[serde(default = "default_text_color")]
    pub color: ColorDef,
    /// Horizontal alignment about the anchor.
    #[serde(default)]
    pub align: TextAlign,
    /// Synthesized bold (offset double-draw).
    #[serde(default)]
    pub bold: bool,
    /// Synthesized italic (shear).
    #[serde(default)]
    pub italic: bool,
    /// Outline stroke width in pixels; stroke is painted before fill.
    #[serde(default)]
    pub stroke_width: f64,
    /// Outline stroke color.
    #[serde(default)]
    pub stroke_color: ColorDef,
    /// Optional drop shadow painted before stroke/fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<TextShadow>,
    /// Render this layer before the images instead of after.
    #[serde(default)]
    pub behind_images: bool,
}

fn default_fifty() -> f64 {
    50.0
}

fn default_text_size() -> f32 {
    48.0
}

fn default_text_color() -> ColorDef {
    ColorDef::WHITE
}

/// Horizontal text alignment about the anchor point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Drop shadow attached to a text layer.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextShadow {
    /// Shadow blur radius in pixels.
    #[serde(default)]
    pub blur_px: f64,
    /// Shadow offset in pixels.
    #[serde(default)]
    pub offset_x: f64,
    /// Shadow offset in pixels.
    #[serde(default)]
    pub offset_y: f64,
    /// Shadow color.
    #[serde(default)]
    pub color: ColorDef,
}

/// A glyph sticker layer.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StickerLayer {
    /// Layer identifier (stable within a scene).
    pub id: String,
    /// Glyph(s) to rasterize, e.g. an emoji codepoint present in the font.
    pub glyph: String,
    /// Relative path to the font file carrying the glyph.
    pub font_source: String,
    /// Horizontal center in percent of canvas width.
    #[serde(default = "default_fifty")]
    pub x_pct: f64,
    /// Vertical center in percent of canvas height.
    #[serde(default = "default_fifty")]
    pub y_pct: f64,
    /// Target width in pixels.
    pub width: f64,
    /// Target height in pixels; also the glyph raster size.
    pub height: f64,
    /// Rotation about the sticker's own center.
    #[serde(default)]
    pub rotation_deg: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Draw order; ascending.
    #[serde(default)]
    pub z_index: i32,
    /// Tint color for the glyph coverage.
    #[serde(default)]
    pub color: ColorDef,
}

/// A freehand annotation stroke. The tool determines which geometry fields
/// are meaningful; the renderer never assumes both forms are populated.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DrawingStroke {
    /// Stroke identifier (stable within a scene).
    pub id: String,
    /// Drawing tool.
    pub tool: StrokeTool,
    /// Stroke color.
    #[serde(default)]
    pub color: ColorDef,
    /// Brush size in pixels.
    #[serde(default = "default_stroke_size")]
    pub size: f64,
    /// Stroke opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Polyline for `Pen`/`Highlighter`.
    #[serde(default)]
    pub points: Vec<PointDef>,
    /// Start point for two-point tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<PointDef>,
    /// End point for two-point tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<PointDef>,
}

fn default_stroke_size() -> f64 {
    4.0
}

/// Annotation drawing tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StrokeTool {
    Pen,
    Line,
    Arrow,
    Rectangle,
    Circle,
    /// Always renders at `opacity * 0.4` and `size * 1.5` regardless of the
    /// stored values.
    Highlighter,
}

impl StrokeTool {
    /// True for tools consuming the polyline form.
    pub fn uses_polyline(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter)
    }
}

/// A point in canvas pixel space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointDef {
    pub x: f64,
    pub y: f64,
}

/// Whole-canvas post-processing stack. A `None` entry is structurally a
/// no-op: the pass is never invoked and the surface stays bit-identical.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct EffectStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duotone: Option<DuotoneFx>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bokeh: Option<BokehFx>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowFx>,
    /// Ordered list; each overlay sees the result of all prior overlays.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub light_leaks: Vec<LightLeakOverlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glitch: Option<GlitchFx>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_exposure: Option<DoubleExposureFx>,
}

/// Two-tone luminance remap.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct DuotoneFx {
    /// Color mapped to luminance 0.
    #[serde(default)]
    pub shadow_color: ColorDef,
    /// Color mapped to luminance 255.
    #[serde(default = "default_text_color")]
    pub highlight_color: ColorDef,
    /// Mix against the original, `0..=100`.
    #[serde(default = "default_hundred")]
    pub intensity: f64,
    /// Luminance contrast, `0..=100`, 50 = neutral.
    #[serde(default = "default_fifty")]
    pub contrast: f64,
}

/// Radial sharp/blur depth-of-field.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct BokehFx {
    /// Focal center in percent of canvas width.
    #[serde(default = "default_fifty")]
    pub center_x_pct: f64,
    /// Focal center in percent of canvas height.
    #[serde(default = "default_fifty")]
    pub center_y_pct: f64,
    /// Focal radius as percent of `min(canvas dims) / 2`.
    #[serde(default = "default_focal_size")]
    pub focal_size_pct: f64,
    /// Blur strength, `0..=100`.
    #[serde(default = "default_fifty")]
    pub intensity: f64,
    /// Blur quality tier scaling the base radius.
    #[serde(default)]
    pub quality: BokehQuality,
}

fn default_focal_size() -> f64 {
    30.0
}

/// Bokeh blur quality tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BokehQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl BokehQuality {
    /// Base blur radius in pixels at intensity 100.
    pub fn base_radius(self) -> f64 {
        match self {
            Self::Low => 5.0,
            Self::Medium => 10.0,
            Self::High => 20.0,
        }
    }
}

/// Canvas shadow synthesis.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShadowFx {
    /// Shadow placement mode.
    pub mode: ShadowMode,
    /// Shadow color.
    #[serde(default)]
    pub color: ColorDef,
    /// Shadow opacity in `[0, 1]`.
    #[serde(default = "default_shadow_alpha")]
    pub alpha: f64,
    /// Shadow blur radius in pixels.
    #[serde(default = "default_shadow_blur")]
    pub blur_px: f64,
}

fn default_shadow_alpha() -> f64 {
    0.5
}

fn default_shadow_blur() -> f64 {
    20.0
}

/// Shadow placement mode.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ShadowMode {
    /// Offset silhouette behind the content.
    Drop { offset_x: f64, offset_y: f64 },
    /// Like `Drop`, offset derived from `distance * cos/sin(angle)`.
    Angle { angle_deg: f64, distance: f64 },
    /// Blurred ellipse anchored at the bottom, behind the content.
    Curved { curve_pct: f64 },
    /// Shadow composited only over opaque content pixels.
    Inner { offset_x: f64, offset_y: f64 },
}

/// One light-leak overlay draw.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LightLeakOverlay {
    /// Relative path to the overlay image.
    pub source: String,
    /// Blend mode for the draw.
    #[serde(default = "default_leak_blend")]
    pub blend: BlendMode,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_shadow_alpha")]
    pub opacity: f64,
    /// Scaled width as percent of canvas width; aspect preserved.
    #[serde(default = "default_hundred")]
    pub scale_pct: f64,
    /// Center in percent of canvas width.
    #[serde(default = "default_fifty")]
    pub x_pct: f64,
    /// Center in percent of canvas height.
    #[serde(default = "default_fifty")]
    pub y_pct: f64,
    /// Rotation about the overlay's own center.
    #[serde(default)]
    pub rotation_deg: f64,
}

fn default_leak_blend() -> BlendMode {
    BlendMode::Screen
}

/// Glitch pass toggles; every sub-pass is independently optional and all
/// randomness is derived from the scene seed.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GlitchFx {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_split: Option<GlitchChannelSplit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanlines: Option<GlitchScanlines>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement: Option<GlitchDisplacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<GlitchNoise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue_shift: Option<GlitchHueShift>,
}

/// RGB channel split: red shifted left, blue shifted right.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlitchChannelSplit {
    /// Horizontal shift in pixels.
    pub shift_px: f64,
}

/// Darkened horizontal scanlines.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlitchScanlines {
    /// Row period in pixels.
    #[serde(default = "default_scanline_spacing")]
    pub spacing_px: u32,
    /// Darkening amount in `[0, 1]`.
    #[serde(default = "default_shadow_alpha")]
    pub intensity: f64,
}

fn default_scanline_spacing() -> u32 {
    4
}

/// Horizontal block displacement driven by the scene seed.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlitchDisplacement {
    /// Band height in pixels.
    #[serde(default = "default_block_height")]
    pub block_height_px: u32,
    /// Maximum horizontal shift in pixels.
    pub max_shift_px: f64,
}

fn default_block_height() -> u32 {
    16
}

/// Additive seeded noise.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlitchNoise {
    /// Noise amount in `[0, 1]`.
    pub amount: f64,
}

/// Hue/saturation shift pass.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlitchHueShift {
    /// Hue rotation in degrees.
    pub degrees: f64,
}

/// Double-exposure overlay blend over the composited canvas.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DoubleExposureFx {
    /// Relative path to the overlay image.
    pub overlay: String,
    /// Blend mode for the overlay draw.
    #[serde(default = "default_leak_blend")]
    pub blend: BlendMode,
    /// Overlay opacity, `0..=100`.
    #[serde(default = "default_fifty")]
    pub opacity: f64,
    /// Apply a full invert to the overlay before blending.
    #[serde(default)]
    pub invert_overlay: bool,
    /// Overlay scale as percent of its letterboxed size.
    #[serde(default = "default_hundred")]
    pub scale_pct: f64,
    /// Overlay offset in pixels from the canvas center.
    #[serde(default)]
    pub offset_x: f64,
    /// Overlay offset in pixels from the canvas center.
    #[serde(default)]
    pub offset_y: f64,
    /// Rotation about the overlay's own center.
    #[serde(default)]
    pub rotation_deg: f64,
}

impl Scene {
    /// Validate scene invariants before rendering.
    ///
    /// Geometry errors (zero canvas, out-of-bounds crops, bad stroke
    /// geometry) fail fast here so the renderer never draws garbage.
    pub fn validate(&self) -> MosaiqResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MosaiqError::validation("canvas width/height must be > 0"));
        }
        if self.images.is_empty() {
            return Err(MosaiqError::validation("scene must contain >= 1 image"));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(MosaiqError::validation("margin must be finite and >= 0"));
        }
        if !self.background.is_finite() {
            return Err(MosaiqError::validation("background color must be finite"));
        }

        for (idx, image) in self.images.iter().enumerate() {
            validate_rel_source(&image.source, &format!("images[{idx}].source"))?;
        }

        for (&idx, settings) in &self.image_settings {
            if idx >= self.images.len() {
                return Err(MosaiqError::validation(format!(
                    "image_settings key {idx} has no matching image (count {})",
                    self.images.len()
                )));
            }
            settings.validate(idx)?;
        }

        self.filters.validate()?;

        for text in &self.texts {
            text.validate()?;
        }
        for sticker in &self.stickers {
            sticker.validate()?;
        }
        for stroke in &self.strokes {
            stroke.validate()?;
        }
        self.effects.validate()?;

        Ok(())
    }
}

impl ImageSettings {
    fn validate(&self, idx: usize) -> MosaiqResult<()> {
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(MosaiqError::validation(format!(
                "image {idx} opacity must be within [0, 1]"
            )));
        }
        if !self.transform.rotation_deg.is_finite() {
            return Err(MosaiqError::validation(format!(
                "image {idx} rotation must be finite"
            )));
        }
        if let Some(crop) = &self.crop {
            for (name, v) in [
                ("x", crop.x),
                ("y", crop.y),
                ("width", crop.width),
                ("height", crop.height),
            ] {
                if !v.is_finite() {
                    return Err(MosaiqError::validation(format!(
                        "image {idx} crop.{name} must be finite"
                    )));
                }
            }
            if crop.width <= 0.0 || crop.height <= 0.0 {
                return Err(MosaiqError::validation(format!(
                    "image {idx} crop extent must be > 0"
                )));
            }
            if crop.x < 0.0 || crop.y < 0.0 || crop.x + crop.width > 100.0
                || crop.y + crop.height > 100.0
            {
                return Err(MosaiqError::validation(format!(
                    "image {idx} crop must stay within [0, 100] percent of the source"
                )));
            }
        }
        if let Some(mask) = &self.mask
            && let Some(gradient) = &mask.gradient
        {
            for (name, v) in [
                ("start_opacity", gradient.start_opacity),
                ("end_opacity", gradient.end_opacity),
            ] {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(MosaiqError::validation(format!(
                        "image {idx} mask gradient {name} must be within [0, 1]"
                    )));
                }
            }
        }
        if let Some(border) = &self.border {
            if !border.width_px.is_finite() || border.width_px < 0.0 {
                return Err(MosaiqError::validation(format!(
                    "image {idx} border width must be finite and >= 0"
                )));
            }
            if !border.corner_radius_px.is_finite() || border.corner_radius_px < 0.0 {
                return Err(MosaiqError::validation(format!(
                    "image {idx} border corner radius must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

impl FilterSettings {
    fn validate(&self) -> MosaiqResult<()> {
        for (name, v, max) in [
            ("brightness", self.brightness, 200.0),
            ("contrast", self.contrast, 200.0),
            ("saturation", self.saturation, 200.0),
            ("blur_px", self.blur_px, 20.0),
            ("hue_rotate_deg", self.hue_rotate_deg, 360.0),
            ("grayscale", self.grayscale, 100.0),
            ("sepia", self.sepia, 100.0),
            ("invert", self.invert, 100.0),
        ] {
            if !v.is_finite() || v < 0.0 || v > max {
                return Err(MosaiqError::validation(format!(
                    "filter {name} must be within [0, {max}]"
                )));
            }
        }
        Ok(())
    }
}

impl TextLayer {
    fn validate(&self) -> MosaiqResult<()> {
        if self.text.is_empty() {
            return Err(MosaiqError::validation(format!(
                "text layer '{}' must have non-empty text",
                self.id
            )));
        }
        validate_rel_source(&self.font_source, "text layer font_source")?;
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(MosaiqError::validation(format!(
                "text layer '{}' size_px must be finite and > 0",
                self.id
            )));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(MosaiqError::validation(format!(
                "text layer '{}' stroke_width must be finite and >= 0",
                self.id
            )));
        }
        Ok(())
    }
}

impl StickerLayer {
    fn validate(&self) -> MosaiqResult<()> {
        if self.glyph.is_empty() {
            return Err(MosaiqError::validation(format!(
                "sticker '{}' must have a non-empty glyph",
                self.id
            )));
        }
        validate_rel_source(&self.font_source, "sticker font_source")?;
        if !self.width.is_finite() || self.width <= 0.0 || !self.height.is_finite()
            || self.height <= 0.0
        {
            return Err(MosaiqError::validation(format!(
                "sticker '{}' width/height must be finite and > 0",
                self.id
            )));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(MosaiqError::validation(format!(
                "sticker '{}' opacity must be within [0, 1]",
                self.id
            )));
        }
        Ok(())
    }
}

impl DrawingStroke {
    fn validate(&self) -> MosaiqResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(MosaiqError::validation(format!(
                "stroke '{}' size must be finite and > 0",
                self.id
            )));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(MosaiqError::validation(format!(
                "stroke '{}' opacity must be within [0, 1]",
                self.id
            )));
        }
        if self.tool.uses_polyline() {
            if self.points.len() < 2 {
                return Err(MosaiqError::validation(format!(
                    "stroke '{}' requires >= 2 points for {:?}",
                    self.id, self.tool
                )));
            }
        } else if self.start.is_none() || self.end.is_none() {
            return Err(MosaiqError::validation(format!(
                "stroke '{}' requires start and end points for {:?}",
                self.id, self.tool
            )));
        }
        Ok(())
    }
}

impl EffectStack {
    fn validate(&self) -> MosaiqResult<()> {
        if let Some(d) = &self.duotone {
            for (name, v) in [("intensity", d.intensity), ("contrast", d.contrast)] {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    return Err(MosaiqError::validation(format!(
                        "duotone {name} must be within [0, 100]"
                    )));
                }
            }
        }
        if let Some(b) = &self.bokeh {
            if !b.intensity.is_finite() || !(0.0..=100.0).contains(&b.intensity) {
                return Err(MosaiqError::validation(
                    "bokeh intensity must be within [0, 100]",
                ));
            }
            if !b.focal_size_pct.is_finite() || b.focal_size_pct <= 0.0 {
                return Err(MosaiqError::validation(
                    "bokeh focal_size_pct must be finite and > 0",
                ));
            }
        }
        if let Some(s) = &self.shadow {
            if !s.alpha.is_finite() || !(0.0..=1.0).contains(&s.alpha) {
                return Err(MosaiqError::validation(
                    "shadow alpha must be within [0, 1]",
                ));
            }
            if !s.blur_px.is_finite() || s.blur_px < 0.0 {
                return Err(MosaiqError::validation(
                    "shadow blur_px must be finite and >= 0",
                ));
            }
            if let ShadowMode::Curved { curve_pct } = s.mode
                && (!curve_pct.is_finite() || !(0.0..=100.0).contains(&curve_pct))
            {
                return Err(MosaiqError::validation(
                    "shadow curve_pct must be within [0, 100]",
                ));
            }
        }
        for (idx, leak) in self.light_leaks.iter().enumerate() {
            validate_rel_source(&leak.source, &format!("light_leaks[{idx}].source"))?;
            if !leak.opacity.is_finite() || !(0.0..=1.0).contains(&leak.opacity) {
                return Err(MosaiqError::validation(format!(
                    "light_leaks[{idx}] opacity must be within [0, 1]"
                )));
            }
            if !leak.scale_pct.is_finite() || leak.scale_pct <= 0.0 {
                return Err(MosaiqError::validation(format!(
                    "light_leaks[{idx}] scale_pct must be finite and > 0"
                )));
            }
        }
        if let Some(g) = &self.glitch {
            if let Some(n) = &g.noise
                && (!n.amount.is_finite() || !(0.0..=1.0).contains(&n.amount))
            {
                return Err(MosaiqError::validation(
                    "glitch noise amount must be within [0, 1]",
                ));
            }
            if let Some(s) = &g.scanlines
                && (s.spacing_px == 0 || !s.intensity.is_finite()
                    || !(0.0..=1.0).contains(&s.intensity))
            {
                return Err(MosaiqError::validation(
                    "glitch scanlines need spacing_px > 0 and intensity in [0, 1]",
                ));
            }
            if let Some(d) = &g.displacement
                && (d.block_height_px == 0 || !d.max_shift_px.is_finite())
            {
                return Err(MosaiqError::validation(
                    "glitch displacement needs block_height_px > 0 and finite shift",
                ));
            }
        }
        if let Some(de) = &self.double_exposure {
            validate_rel_source(&de.overlay, "double_exposure.overlay")?;
            if !de.opacity.is_finite() || !(0.0..=100.0).contains(&de.opacity) {
                return Err(MosaiqError::validation(
                    "double_exposure opacity must be within [0, 100]",
                ));
            }
            if !de.scale_pct.is_finite() || de.scale_pct <= 0.0 {
                return Err(MosaiqError::validation(
                    "double_exposure scale_pct must be finite and > 0",
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_rel_source(source: &str, field: &str) -> MosaiqResult<()> {
    if source.trim().is_empty() {
        return Err(MosaiqError::validation(format!(
            "{field} must be non-empty"
        )));
    }
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(MosaiqError::validation(format!(
            "{field} must be a relative path"
        )));
    }
    for part in s.split('/') {
        if part == ".." {
            return Err(MosaiqError::validation(format!(
                "{field} must not contain '..'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn minimal_scene() -> Scene {
        Scene {
            canvas: Canvas {
                width: 64,
                height: 64,
            },
            background: ColorDef::WHITE,
            layout: LayoutKind::Single,
            margin: 4.0,
            images: vec![ImageRef {
                source: "a.png".to_string(),
            }],
            image_settings: BTreeMap::new(),
            filters: FilterSettings::default(),
            blend: BlendMode::Normal,
            texts: vec![],
            stickers: vec![],
            strokes: vec![],
            effects: EffectStack::default(),
            seed: 0,
        }
    }

    #[test]
    fn minimal_scene_validates() {
        minimal_scene().validate().unwrap();
    }

    #[test]
    fn rejects_empty_images_and_bad_margin() {
        let mut scene = minimal_scene();
        scene.images.clear();
        assert!(scene.validate().is_err());

        let mut scene = minimal_scene();
        scene.margin = -1.0;
        assert!(scene.validate().is_err());
    }

    #[test]
    fn crop_is_validated_not_clamped() {
        let mut scene = minimal_scene();
        scene.image_settings.insert(
            0,
            ImageSettings {
                crop: Some(CropRect {
                    x: 60.0,
                    y: 0.0,
                    width: 60.0,
                    height: 100.0,
                }),
                ..ImageSettings::default()
            },
        );
        let err = scene.validate().unwrap_err();
        assert!(err.to_string().contains("crop"));

        let mut scene = minimal_scene();
        scene.image_settings.insert(
            0,
            ImageSettings {
                crop: Some(CropRect::full()),
                ..ImageSettings::default()
            },
        );
        scene.validate().unwrap();
    }

    #[test]
    fn settings_for_missing_image_are_rejected() {
        let mut scene = minimal_scene();
        scene.image_settings.insert(3, ImageSettings::default());
        assert!(scene.validate().is_err());
    }

    #[test]
    fn stroke_geometry_depends_on_tool() {
        let mut scene = minimal_scene();
        scene.strokes.push(DrawingStroke {
            id: "s1".to_string(),
            tool: StrokeTool::Line,
            color: ColorDef::BLACK,
            size: 4.0,
            opacity: 1.0,
            points: vec![PointDef { x: 0.0, y: 0.0 }, PointDef { x: 5.0, y: 5.0 }],
            start: None,
            end: None,
        });
        assert!(scene.validate().is_err());

        scene.strokes[0].start = Some(PointDef { x: 0.0, y: 0.0 });
        scene.strokes[0].end = Some(PointDef { x: 10.0, y: 10.0 });
        scene.validate().unwrap();
    }

    #[test]
    fn unknown_layout_and_mask_fall_back() {
        let layout: LayoutKind = serde_json::from_str("\"SomeFutureLayout\"").unwrap();
        assert_eq!(layout, LayoutKind::Unknown);

        let shape: MaskShape = serde_json::from_str("\"Blob\"").unwrap();
        assert_eq!(shape, MaskShape::Unknown);
    }

    #[test]
    fn scene_json_round_trip() {
        let mut scene = minimal_scene();
        scene.effects.duotone = Some(DuotoneFx {
            shadow_color: ColorDef::rgba(0.1, 0.0, 0.3, 1.0),
            highlight_color: ColorDef::rgba(1.0, 0.9, 0.6, 1.0),
            intensity: 80.0,
            contrast: 50.0,
        });
        let json = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        assert_eq!(back.images.len(), 1);
        assert!(back.effects.duotone.is_some());
    }
}
