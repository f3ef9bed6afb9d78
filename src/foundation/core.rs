use crate::foundation::error::{OverlayError, OverlayResult};

/// Tight axis-aligned box around the non-black pixels of a target, in pixel coordinates.
///
/// Both corners are inclusive: `max_x`/`max_y` are the coordinates of the last non-black
/// column/row, not one past it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// Create a validated box with `min <= max` on both axes.
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> OverlayResult<Self> {
        if min_x > max_x || min_y > max_y {
            return Err(OverlayError::validation("BoundingBox min must be <= max"));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Horizontal extent `max_x - min_x` (a one-column box has width 0).
    pub fn width(self) -> u32 {
        self.max_x - self.min_x
    }

    /// Vertical extent `max_y - min_y`.
    pub fn height(self) -> u32 {
        self.max_y - self.min_y
    }

    /// Return `true` when `(x, y)` lies inside the box, edges included.
    pub fn contains(self, x: i64, y: i64) -> bool {
        x >= i64::from(self.min_x)
            && x <= i64::from(self.max_x)
            && y >= i64::from(self.min_y)
            && y <= i64::from(self.max_y)
    }
}

/// Size and top-left position of the material on the target canvas.
///
/// Paste coordinates are signed so a footprint may start left of or above the canvas; the
/// blender clips whatever falls outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPlan {
    pub paste_x: i64,
    pub paste_y: i64,
    pub new_width: u32, // >= 1
    pub new_height: u32, // >= 1
}

impl PlacementPlan {
    /// Exclusive right edge of the footprint.
    pub fn right(self) -> i64 {
        self.paste_x + i64::from(self.new_width)
    }

    /// Exclusive bottom edge of the footprint.
    pub fn bottom(self) -> i64 {
        self.paste_y + i64::from(self.new_height)
    }

    /// Return `true` when the whole footprint lies inside a `width`x`height` canvas.
    pub fn fits_canvas(self, width: u32, height: u32) -> bool {
        self.paste_x >= 0
            && self.paste_y >= 0
            && self.right() <= i64::from(width)
            && self.bottom() <= i64::from(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_rejects_inverted_corners() {
        assert!(BoundingBox::new(5, 0, 4, 0).is_err());
        assert!(BoundingBox::new(0, 5, 0, 4).is_err());
        let b = BoundingBox::new(3, 3, 3, 3).unwrap();
        assert_eq!((b.width(), b.height()), (0, 0));
    }

    #[test]
    fn bbox_contains_is_inclusive() {
        let b = BoundingBox::new(30, 30, 70, 70).unwrap();
        assert!(b.contains(30, 30));
        assert!(b.contains(70, 70));
        assert!(!b.contains(71, 50));
        assert!(!b.contains(29, 50));
        assert!(!b.contains(-1, -1));
    }

    #[test]
    fn plan_edges_and_canvas_fit() {
        let plan = PlacementPlan {
            paste_x: 90,
            paste_y: 0,
            new_width: 10,
            new_height: 5,
        };
        assert_eq!(plan.right(), 100);
        assert_eq!(plan.bottom(), 5);
        assert!(plan.fits_canvas(100, 100));
        assert!(!plan.fits_canvas(99, 100));

        let negative = PlacementPlan {
            paste_x: -1,
            ..plan
        };
        assert!(!negative.fits_canvas(200, 200));
    }
}
