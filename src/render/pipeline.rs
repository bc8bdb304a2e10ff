use crate::{
    animation::transitions::{TransitionKind, render_transition_frame},
    assets::store::PreparedAssetStore,
    effects::bokeh::apply_bokeh,
    effects::double_exposure::apply_double_exposure,
    effects::duotone::apply_duotone,
    effects::glitch::apply_glitch,
    effects::light_leaks::apply_light_leaks,
    effects::shadow::apply_shadow,
    foundation::error::MosaiqResult,
    layout::solver::compute_layout,
    overlay::annotations::draw_strokes,
    overlay::stickers::draw_stickers,
    overlay::text::draw_text_layer,
    render::filters::FilterChain,
    render::layer::{letterbox_image, render_image_with_chain},
    render::surface::{Surface, composite_over},
    scene::model::{BlendMode, ImageSettings, Scene},
};

/// Render a scene to a finished premultiplied-RGBA8 surface.
///
/// Stage order is fixed: background fill, behind-text, layout draw,
/// front-text, stickers, annotations, light leaks, double exposure, glitch,
/// then shadow, bokeh and duotone. Every stage consumes the previous
/// stage's output; disabled effects are structurally skipped.
///
/// The call is a pure function of `(scene, assets)`; nothing is retained
/// between calls.
#[tracing::instrument(skip(scene, assets))]
pub fn render_scene(scene: &Scene, assets: &PreparedAssetStore) -> MosaiqResult<Surface> {
    scene.validate()?;

    let mut sizes = Vec::with_capacity(scene.images.len());
    for image_ref in &scene.images {
        let image = assets.image(&image_ref.source)?;
        sizes.push((image.width, image.height));
    }
    let slots = compute_layout(scene.layout, scene.canvas, &sizes, scene.margin)?;
    tracing::debug!(slots = slots.len(), layout = ?scene.layout, "layout solved");

    let mut canvas = Surface::filled(
        scene.canvas.width,
        scene.canvas.height,
        scene.background.to_rgba8_premul(),
    )?;

    for text in scene.texts.iter().filter(|t| t.behind_images) {
        draw_text_layer(&mut canvas, text, assets)?;
    }

    let default_settings = ImageSettings::default();
    let chain = FilterChain::compile(&scene.filters);
    for (idx, slot) in slots.iter().enumerate() {
        let image = assets.image(&scene.images[idx].source)?;
        let settings = scene.image_settings.get(&idx).unwrap_or(&default_settings);
        render_image_with_chain(&mut canvas, image, slot, settings, &chain, scene.blend)?;
    }

    for text in scene.texts.iter().filter(|t| !t.behind_images) {
        draw_text_layer(&mut canvas, text, assets)?;
    }
    draw_stickers(&mut canvas, &scene.stickers, assets)?;
    draw_strokes(&mut canvas, &scene.strokes)?;

    apply_light_leaks(&mut canvas, &scene.effects.light_leaks, assets)?;
    if let Some(de) = &scene.effects.double_exposure {
        apply_double_exposure(&mut canvas, de, assets)?;
    }
    if let Some(glitch) = &scene.effects.glitch {
        apply_glitch(&mut canvas, glitch, scene.seed)?;
    }
    if let Some(shadow) = &scene.effects.shadow {
        canvas = apply_shadow(&canvas, shadow)?;
    }
    if let Some(bokeh) = &scene.effects.bokeh {
        canvas = apply_bokeh(&canvas, bokeh)?;
    }
    if let Some(duotone) = &scene.effects.duotone {
        apply_duotone(&mut canvas, duotone);
    }

    Ok(canvas)
}

/// Render one slideshow transition frame between two scene images.
///
/// Each image is letterboxed full-canvas over the scene background, then the
/// transition kernel interpolates at `progress`.
#[tracing::instrument(skip(scene, assets))]
pub fn render_slideshow_frame(
    scene: &Scene,
    assets: &PreparedAssetStore,
    from_idx: usize,
    to_idx: usize,
    kind: TransitionKind,
    progress: f64,
) -> MosaiqResult<Surface> {
    let from = slideshow_still(scene, assets, from_idx)?;
    let to = slideshow_still(scene, assets, to_idx)?;
    render_transition_frame(&from, &to, kind, progress, scene.seed)
}

fn slideshow_still(
    scene: &Scene,
    assets: &PreparedAssetStore,
    idx: usize,
) -> MosaiqResult<Surface> {
    let image_ref = scene.images.get(idx).ok_or_else(|| {
        crate::foundation::error::MosaiqError::validation(format!(
            "slideshow image index {idx} out of range ({} images)",
            scene.images.len()
        ))
    })?;
    let image = assets.image(&image_ref.source)?;

    let mut still = Surface::filled(
        scene.canvas.width,
        scene.canvas.height,
        scene.background.to_rgba8_premul(),
    )?;
    let letterboxed = letterbox_image(image, scene.canvas)?;
    composite_over(&mut still, &letterboxed, 1.0, BlendMode::Normal)?;
    Ok(still)
}
