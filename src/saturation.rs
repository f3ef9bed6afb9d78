use image::{Rgb, RgbImage};

use crate::foundation::error::{OverlayError, OverlayResult};
use crate::mask::Mask;

/// Saturation multiplier of the centered preset.
pub const MILD_SATURATION: f64 = 0.99;
/// Saturation multiplier of the random-placement preset.
pub const MODERATE_SATURATION: f64 = 0.95;

/// 8-bit HSV triple with hue in `[0, 180)` (half degrees), saturation and value in `[0, 255]`.
pub type Hsv8 = [u8; 3];

/// Scale the HSV saturation of every masked pixel by `factor`.
///
/// Unmasked pixels are copied untouched. The scaled saturation is truncated, never rounded
/// up, so a factor below 1 always moves a colored pixel toward gray.
#[tracing::instrument(skip(target, mask))]
pub fn desaturate_masked(target: &RgbImage, mask: &Mask, factor: f64) -> OverlayResult<RgbImage> {
    if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
        return Err(OverlayError::validation(format!(
            "saturation factor must be in [0, 1], got {factor}"
        )));
    }
    if target.dimensions() != (mask.width(), mask.height()) {
        return Err(OverlayError::validation(
            "desaturate_masked expects a mask matching the target size",
        ));
    }

    let mut out = target.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if !mask.get(x, y) {
            continue;
        }
        let [h, s, v] = rgb_to_hsv8(px.0);
        let s = (f64::from(s) * factor) as u8;
        *px = Rgb(hsv8_to_rgb([h, s, v]));
    }
    Ok(out)
}

pub fn rgb_to_hsv8(rgb: [u8; 3]) -> Hsv8 {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        ((diff as f32) * 255.0 / (v as f32)).round() as i32
    };

    let h = if diff == 0 {
        0
    } else {
        let deg = if v == r {
            60.0 * (g - b) as f32 / diff as f32
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff as f32
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff as f32
        };
        let deg = if deg < 0.0 { deg + 360.0 } else { deg };
        ((deg / 2.0).round() as i32) % 180
    };

    [h as u8, s.clamp(0, 255) as u8, v as u8]
}

pub fn hsv8_to_rgb(hsv: Hsv8) -> [u8; 3] {
    let s = f32::from(hsv[1]) / 255.0;
    let v = f32::from(hsv[2]) / 255.0;
    if s <= 0.0 {
        let c = to_u8(v);
        return [c, c, c];
    }

    // Sector units: 30 half-degrees per sector, six sectors.
    let mut h = f32::from(hsv[0]) / 30.0;
    if h >= 6.0 {
        h -= 6.0;
    }
    let sector = h.floor();
    let f = h - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

fn to_u8(x: f32) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}
