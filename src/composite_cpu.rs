use image::{RgbImage, RgbaImage};

use crate::foundation::core::PlacementPlan;
use crate::foundation::error::{OverlayError, OverlayResult};

pub type PremulRgba8 = [u8; 4];

const OPAQUE_BLACK: PremulRgba8 = [0, 0, 0, 255];

/// Premultiplied source-over: `src + dst * (255 - src_a) / 255` per channel.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255 - u16::from(src[3]);
    std::array::from_fn(|i| src[i].saturating_add(mul_div255(u16::from(dst[i]), inv)))
}

/// `over` of a premultiplied RGBA8 `layer` onto an equally sized `canvas`.
pub fn over_layer(canvas: &mut [u8], layer: &[u8]) -> OverlayResult<()> {
    if canvas.len() != layer.len() || !canvas.len().is_multiple_of(4) {
        return Err(OverlayError::validation(
            "layer and canvas must be rgba8 buffers of the same size",
        ));
    }
    for (d, s) in canvas.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn premultiply(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [
        mul_div255(u16::from(px[0]), a),
        mul_div255(u16::from(px[1]), a),
        mul_div255(u16::from(px[2]), a),
        px[3],
    ]
}

/// Straight RGBA8 pixel as it lands on a transparent layer when pasted through its own alpha,
/// returned premultiplied. Every band, alpha included, is scaled by `a / 255`, so the pixel's
/// effective opacity becomes `a * a / 255`.
pub fn self_masked(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    premultiply(px.map(|c| mul_div255(u16::from(c), a)))
}

/// Opaque premultiplied RGBA8 copy of an RGB image.
pub fn opaque_rgba8(img: &RgbImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(img.as_raw().len() / 3 * 4);
    for px in img.pixels() {
        out.extend_from_slice(&[px.0[0], px.0[1], px.0[2], 255]);
    }
    out
}

/// Transparent `width`x`height` premultiplied layer with `material` pasted through its own
/// alpha at the plan's top-left corner (see [`self_masked`]). Material pixels outside the
/// canvas are dropped.
pub fn place_layer(
    width: u32,
    height: u32,
    material: &RgbaImage,
    plan: PlacementPlan,
) -> OverlayResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| OverlayError::validation("layer buffer size overflow"))?;
    let mut layer = vec![0u8; len];

    for (x, y, px) in material.enumerate_pixels() {
        let dx = plan.paste_x + i64::from(x);
        let dy = plan.paste_y + i64::from(y);
        if dx < 0 || dy < 0 || dx >= i64::from(width) || dy >= i64::from(height) {
            continue;
        }
        let idx = ((dy as usize) * (width as usize) + (dx as usize)) * 4;
        layer[idx..idx + 4].copy_from_slice(&self_masked(px.0));
    }
    Ok(layer)
}

/// Composite `rgba` (premultiplied) over opaque black and drop the alpha channel.
pub fn flatten_over_black(rgba: &[u8], width: u32, height: u32) -> OverlayResult<RgbImage> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| OverlayError::validation("flatten buffer size overflow"))?;
    if rgba.len() != expected_len {
        return Err(OverlayError::validation(
            "flatten_over_black expects a buffer matching width*height*4",
        ));
    }

    let mut rgb = Vec::with_capacity(expected_len / 4 * 3);
    for s in rgba.chunks_exact(4) {
        let out = over(OPAQUE_BLACK, [s[0], s[1], s[2], s[3]]);
        rgb.extend_from_slice(&out[..3]);
    }
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| OverlayError::validation("flattened buffer does not match dimensions"))
}

/// Paste `material` onto `target` at the plan position with the over operator, then resolve
/// any residual transparency against black.
#[tracing::instrument(skip(target, material))]
pub fn blend(
    target: &RgbImage,
    material: &RgbaImage,
    plan: PlacementPlan,
) -> OverlayResult<RgbImage> {
    let (width, height) = target.dimensions();
    let mut canvas = opaque_rgba8(target);
    let layer = place_layer(width, height, material, plan)?;
    over_layer(&mut canvas, &layer)?;
    flatten_over_black(&canvas, width, height)
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
