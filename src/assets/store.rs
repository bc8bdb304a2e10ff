use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    assets::decode::{PreparedImage, decode_image},
    foundation::error::{MosaiqError, MosaiqResult},
    scene::model::Scene,
};

/// Prepared font ready for glyph rasterization.
#[derive(Clone)]
pub struct PreparedFont {
    /// Parsed font.
    pub font: ab_glyph::FontArc,
}

impl std::fmt::Debug for PreparedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedFont").finish_non_exhaustive()
    }
}

/// Immutable store of decoded assets keyed by normalized relative path.
///
/// All IO and decoding is front-loaded by [`PreparedAssetStore::prepare`] so
/// render stages stay deterministic and IO-free. A caller that ran an image
/// through an external processing service simply inserts the returned bitmap
/// under the same key before rendering.
#[derive(Clone, Debug, Default)]
pub struct PreparedAssetStore {
    root: PathBuf,
    images: HashMap<String, PreparedImage>,
    fonts: HashMap<String, PreparedFont>,
}

impl PreparedAssetStore {
    /// Prepare every image and font referenced by `scene`, resolving
    /// relative paths against `root`.
    pub fn prepare(scene: &Scene, root: impl Into<PathBuf>) -> MosaiqResult<Self> {
        let mut out = Self {
            root: root.into(),
            images: HashMap::new(),
            fonts: HashMap::new(),
        };

        for image in &scene.images {
            out.load_image(&image.source)?;
        }
        for leak in &scene.effects.light_leaks {
            out.load_image(&leak.source)?;
        }
        if let Some(de) = &scene.effects.double_exposure {
            out.load_image(&de.overlay)?;
        }
        for text in &scene.texts {
            out.load_font(&text.font_source)?;
        }
        for sticker in &scene.stickers {
            out.load_font(&sticker.font_source)?;
        }

        Ok(out)
    }

    /// Empty store for programmatic use; populate with `insert_*`.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Root directory used when resolving relative asset paths.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lookup a prepared image by its scene source path.
    pub fn image(&self, source: &str) -> MosaiqResult<&PreparedImage> {
        let key = normalize_rel_path(source)?;
        self.images
            .get(&key)
            .ok_or_else(|| MosaiqError::render(format!("image '{source}' was not prepared")))
    }

    /// Lookup a prepared font by its scene source path.
    pub fn font(&self, source: &str) -> MosaiqResult<&PreparedFont> {
        let key = normalize_rel_path(source)?;
        self.fonts
            .get(&key)
            .ok_or_else(|| MosaiqError::render(format!("font '{source}' was not prepared")))
    }

    /// Insert (or replace) a decoded image under a scene source key.
    pub fn insert_image(&mut self, source: &str, image: PreparedImage) -> MosaiqResult<()> {
        let key = normalize_rel_path(source)?;
        self.images.insert(key, image);
        Ok(())
    }

    /// Insert (or replace) a parsed font under a scene source key.
    pub fn insert_font(&mut self, source: &str, font: PreparedFont) -> MosaiqResult<()> {
        let key = normalize_rel_path(source)?;
        self.fonts.insert(key, font);
        Ok(())
    }

    fn load_image(&mut self, source: &str) -> MosaiqResult<()> {
        let key = normalize_rel_path(source)?;
        if self.images.contains_key(&key) {
            return Ok(());
        }
        let bytes = self.read_bytes(&key)?;
        let image = decode_image(&bytes)?;
        self.images.insert(key, image);
        Ok(())
    }

    fn load_font(&mut self, source: &str) -> MosaiqResult<()> {
        let key = normalize_rel_path(source)?;
        if self.fonts.contains_key(&key) {
            return Ok(());
        }
        let bytes = self.read_bytes(&key)?;
        let font = ab_glyph::FontArc::try_from_vec(bytes)
            .with_context(|| format!("parse font '{key}'"))?;
        self.fonts.insert(key, PreparedFont { font });
        Ok(())
    }

    fn read_bytes(&self, norm: &str) -> MosaiqResult<Vec<u8>> {
        let p = self.root.join(Path::new(norm));
        std::fs::read(&p).map_err(|e| {
            MosaiqError::render(format!("failed to read asset '{}': {e}", p.display()))
        })
    }
}

/// Normalize a scene-relative asset path: forward slashes, no leading `/`,
/// no `..` components, no empty segments.
pub fn normalize_rel_path(rel: &str) -> MosaiqResult<String> {
    let s = rel.trim().replace('\\', "/");
    if s.is_empty() {
        return Err(MosaiqError::validation("asset path must be non-empty"));
    }
    if s.starts_with('/') {
        return Err(MosaiqError::validation(format!(
            "asset path '{rel}' must be relative"
        )));
    }
    let mut parts = Vec::new();
    for part in s.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(MosaiqError::validation(format!(
                    "asset path '{rel}' must not contain '..'"
                )));
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return Err(MosaiqError::validation(format!(
            "asset path '{rel}' has no usable components"
        )));
    }
    Ok(parts.join("/"))
}
