/// Convenience result type used across mosaiq.
pub type MosaiqResult<T> = Result<T, MosaiqError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MosaiqError {
    /// Invalid user-provided scene or settings data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while computing image placement for a layout.
    #[error("layout error: {0}")]
    Layout(String),

    /// Errors while rasterizing a scene into pixels.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MosaiqError {
    /// Build a [`MosaiqError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MosaiqError::Layout`] value.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Build a [`MosaiqError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MosaiqError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_matching_variants() {
        assert!(matches!(
            MosaiqError::validation("x"),
            MosaiqError::Validation(_)
        ));
        assert!(matches!(MosaiqError::layout("x"), MosaiqError::Layout(_)));
        assert!(matches!(MosaiqError::render("x"), MosaiqError::Render(_)));
    }

    #[test]
    fn display_includes_category_prefix() {
        let e = MosaiqError::layout("circular layout requires at least 3 images");
        assert_eq!(
            e.to_string(),
            "layout error: circular layout requires at least 3 images"
        );
    }
}
