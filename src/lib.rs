//! Mosaiq is a deterministic photo-collage composition and rendering engine.
//!
//! A collage is described declaratively by a [`Scene`] (ordered images, a
//! layout, per-image settings, overlays and an effect stack) and rendered to
//! pixels by [`render_scene`]. The pipeline is CPU-only and synchronous:
//!
//! 1. **Prepare**: `Scene -> PreparedAssetStore` (all IO/decoding up front)
//! 2. **Layout**: `Scene -> Vec<Slot>` (one placement rectangle per image)
//! 3. **Render**: slots, overlays and effects -> [`Surface`] (premultiplied
//!    RGBA8), ready for PNG encoding or further processing
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: every render is a pure function of
//!   `(scene, assets)`; procedural noise (dissolve, glitch) derives from the
//!   scene seed.
//! - **No IO in renderers**: external IO is front-loaded in
//!   [`PreparedAssetStore`].
//! - **Premultiplied RGBA8** end-to-end: renderers output premultiplied
//!   pixels; straight alpha exists only at decode and export boundaries.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod animation;
mod assets;
mod effects;
mod foundation;
mod layout;
mod overlay;
mod render;
mod scene;

pub use animation::ease::Ease;
pub use animation::transitions::{TransitionKind, parse_transition, render_transition_frame};
pub use assets::color::ColorDef;
pub use assets::decode::{PreparedImage, decode_image};
pub use assets::store::{PreparedAssetStore, PreparedFont, normalize_rel_path};
pub use foundation::core::{Canvas, Point, Rect, Rgba8Premul, Vec2, aspect_fill, aspect_fit};
pub use foundation::error::{MosaiqError, MosaiqResult};
pub use layout::solver::{PolaroidFrame, Slot, SlotFit, compute_layout};
pub use overlay::annotations::draw_strokes;
pub use overlay::stickers::draw_stickers;
pub use overlay::text::draw_text_layer;
pub use render::layer::render_image_into;
pub use render::pipeline::{render_scene, render_slideshow_frame};
pub use render::surface::{Surface, composite_over};
pub use scene::model::{
    BlendMode, BokehFx, BokehQuality, BorderSettings, CropRect, DoubleExposureFx, DrawingStroke,
    DuotoneFx, EffectStack, FilterSettings, GlitchChannelSplit, GlitchDisplacement, GlitchFx,
    GlitchHueShift, GlitchNoise, GlitchScanlines, GradientDirection, GradientMask, ImageRef,
    ImageSettings, ImageTransform, LayoutKind, LightLeakOverlay, MaskSettings, MaskShape,
    PointDef, Scene, ShadowFx, ShadowMode, StickerLayer, StrokeTool, TextAlign, TextLayer,
    TextShadow,
};

pub use effects::blur::{blur_surface, blur_surface_sigma};
pub use effects::bokeh::apply_bokeh;
pub use effects::double_exposure::apply_double_exposure;
pub use effects::duotone::apply_duotone;
pub use effects::glitch::apply_glitch;
pub use effects::light_leaks::apply_light_leaks;
pub use effects::shadow::apply_shadow;
