pub type OverlayResult<T> = Result<T, OverlayError>;

#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    #[error("no material images available")]
    NoMaterialAvailable,

    #[error("target has no non-black pixels")]
    EmptyMask,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OverlayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Skips are expected outcomes of a batch, everything else is a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NoMaterialAvailable | Self::EmptyMask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            OverlayError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(OverlayError::EmptyMask.to_string().contains("non-black"));
        assert!(
            OverlayError::NoMaterialAvailable
                .to_string()
                .contains("no material")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = OverlayError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn only_material_and_mask_are_skips() {
        assert!(OverlayError::EmptyMask.is_skip());
        assert!(OverlayError::NoMaterialAvailable.is_skip());
        assert!(!OverlayError::validation("bad").is_skip());
        assert!(!OverlayError::Io(std::io::Error::other("disk")).is_skip());
    }
}
