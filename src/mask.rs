use image::RgbImage;

use crate::foundation::core::BoundingBox;
use crate::foundation::error::{OverlayError, OverlayResult};

/// Channel values at or below this count as black.
pub const BLACK_THRESHOLD: u8 = 10;

/// Per-pixel non-black classification of a target image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Mask {
    /// Classify every pixel of `img`: `true` when any channel exceeds [`BLACK_THRESHOLD`].
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let cells = img
            .pixels()
            .map(|px| px.0.iter().any(|&c| c > BLACK_THRESHOLD))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Like [`Mask::get`] but coordinates outside the image read as black.
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.get(x as u32, y as u32)
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Tight box around the `true` cells, or `None` for an all-black mask.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let w = self.width as usize;
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut any = false;

        for (i, _) in self.cells.iter().enumerate().filter(|(_, c)| **c) {
            let x = (i % w) as u32;
            let y = (i / w) as u32;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            any = true;
        }

        any.then_some(BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }
}

/// Build the mask for `target` and its bounding box.
///
/// Fails with [`OverlayError::EmptyMask`] when the whole image is black.
pub fn extract(target: &RgbImage) -> OverlayResult<(Mask, BoundingBox)> {
    let mask = Mask::from_rgb(target);
    let bbox = mask.bounding_box().ok_or(OverlayError::EmptyMask)?;
    Ok((mask, bbox))
}
