use image::{RgbImage, RgbaImage};
use rand::Rng;

use crate::{
    composite_cpu,
    foundation::core::{BoundingBox, PlacementPlan},
    foundation::error::{OverlayError, OverlayResult},
    geometry::{self, PlacementMode, ScaleRange},
    mask, material, saturation,
};

/// Tunables of one compositing run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    pub saturation_factor: f64,
    pub scale_range: ScaleRange,
    pub alpha_factor: f64,
    pub placement: PlacementMode,
}

impl CompositeParams {
    /// Quarter-offset placement with mild (0.99) desaturation.
    pub fn centered() -> Self {
        Self {
            saturation_factor: saturation::MILD_SATURATION,
            scale_range: ScaleRange::DEFAULT,
            alpha_factor: material::ALPHA_FACTOR,
            placement: PlacementMode::Centered,
        }
    }

    /// Random in-ROI placement with moderate (0.95) desaturation and black-region clipping.
    pub fn random() -> Self {
        Self {
            saturation_factor: saturation::MODERATE_SATURATION,
            placement: PlacementMode::Random,
            ..Self::centered()
        }
    }

    pub fn for_mode(mode: PlacementMode) -> Self {
        match mode {
            PlacementMode::Centered => Self::centered(),
            PlacementMode::Random => Self::random(),
        }
    }

    pub fn validate(&self) -> OverlayResult<()> {
        self.scale_range.validate()?;
        for (name, v) in [
            ("saturation factor", self.saturation_factor),
            ("alpha factor", self.alpha_factor),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(OverlayError::validation(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self::centered()
    }
}

/// Output of one compositing run plus the geometry that produced it.
#[derive(Clone, Debug)]
pub struct CompositeOutcome {
    pub image: RgbImage,
    pub roi: BoundingBox,
    pub plan: PlacementPlan,
}

/// Composite `material` onto the non-black region of `target`.
///
/// Stages run in order: mask extraction, desaturation of the non-black area, placement
/// planning, material resize/fade (plus clearing over black in random mode), and the final
/// over-then-flatten blend. The result always has the target's dimensions.
///
/// Fails with [`OverlayError::EmptyMask`] when the target is entirely black.
pub fn composite<R: Rng + ?Sized>(
    target: &RgbImage,
    material: &RgbaImage,
    params: &CompositeParams,
    rng: &mut R,
) -> OverlayResult<CompositeOutcome> {
    params.validate()?;

    let (mask, roi) = mask::extract(target)?;
    let desaturated = saturation::desaturate_masked(target, &mask, params.saturation_factor)?;

    let plan = geometry::plan_placement(
        roi,
        material.dimensions(),
        params.scale_range,
        params.placement,
        rng,
    )?;

    let clip = match params.placement {
        PlacementMode::Random => Some(&mask),
        PlacementMode::Centered => None,
    };
    let prepared = material::transform(material, plan, params.alpha_factor, clip)?;
    let image = composite_cpu::blend(&desaturated, &prepared, plan)?;

    Ok(CompositeOutcome { image, roi, plan })
}
