use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::PlacementPlan;
use crate::foundation::error::{OverlayError, OverlayResult};
use crate::mask::Mask;

/// Uniform transparency applied to every material pixel.
pub const ALPHA_FACTOR: f64 = 0.95;

/// Result of clearing material pixels that land on black background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipStats {
    /// Pixels whose alpha was forced to 0.
    pub cleared: usize,
    /// Whether part of the footprint fell outside the target canvas.
    pub off_canvas: bool,
}

/// Resize `material` to the plan size with Lanczos3 resampling.
pub fn resize(material: &RgbaImage, plan: PlacementPlan) -> OverlayResult<RgbaImage> {
    if plan.new_width == 0 || plan.new_height == 0 {
        return Err(OverlayError::validation("placement size must be at least 1x1"));
    }
    Ok(imageops::resize(
        material,
        plan.new_width,
        plan.new_height,
        FilterType::Lanczos3,
    ))
}

/// Multiply every alpha value by `factor`, truncating toward zero.
pub fn fade_alpha(img: &mut RgbaImage, factor: f64) {
    for px in img.pixels_mut() {
        px.0[3] = (f64::from(px.0[3]) * factor) as u8;
    }
}

/// Force alpha to 0 wherever the pixel would land on a black or off-canvas cell of `mask`.
///
/// `img` is assumed to be placed at `(plan.paste_x, plan.paste_y)`. Cells past the target
/// edge read as black, so a footprint larger than the visible crop is zero-padded instead of
/// rejected.
pub fn clip_to_mask(img: &mut RgbaImage, mask: &Mask, plan: PlacementPlan) -> ClipStats {
    let mut stats = ClipStats {
        cleared: 0,
        off_canvas: !plan.fits_canvas(mask.width(), mask.height()),
    };

    for (x, y, px) in img.enumerate_pixels_mut() {
        let dx = plan.paste_x + i64::from(x);
        let dy = plan.paste_y + i64::from(y);
        if !mask.get_signed(dx, dy) && px.0[3] != 0 {
            px.0[3] = 0;
            stats.cleared += 1;
        }
    }
    stats
}

/// Run the material stages in order: resize, fade, and (when `clip` is given) clear the
/// pixels that would cover black background.
#[tracing::instrument(skip(material, clip))]
pub fn transform(
    material: &RgbaImage,
    plan: PlacementPlan,
    alpha_factor: f64,
    clip: Option<&Mask>,
) -> OverlayResult<RgbaImage> {
    if !alpha_factor.is_finite() || !(0.0..=1.0).contains(&alpha_factor) {
        return Err(OverlayError::validation(format!(
            "alpha factor must be in [0, 1], got {alpha_factor}"
        )));
    }

    let mut out = resize(material, plan)?;
    fade_alpha(&mut out, alpha_factor);

    if let Some(mask) = clip {
        let stats = clip_to_mask(&mut out, mask, plan);
        if stats.off_canvas {
            tracing::warn!(?plan, "material footprint exceeds the target, padding with black");
        }
        tracing::debug!(cleared = stats.cleared, "cleared material over black background");
    }
    Ok(out)
}
