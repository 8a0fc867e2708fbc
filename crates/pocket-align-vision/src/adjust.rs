//! Color-space pre-processing: brightness/contrast and the centered mask.

use image::{Luma, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use pocket_align_core::{MaskKind, MaskSpec};

/// Affine per-channel adjustment `sat(p * gain + bias)`, rounding to nearest.
pub fn adjust_brightness_contrast(img: &RgbImage, gain: f64, bias: f64) -> RgbImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        for c in px.0.iter_mut() {
            *c = (*c as f64 * gain + bias).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Zero every pixel outside the mask region. `MaskKind::None` is a no-op.
///
/// The rectangle is `width x height` and the circle has diameter `width`,
/// both centered on `(w/2, h/2)` in integer pixels.
pub fn apply_center_mask(img: &mut RgbImage, mask: &MaskSpec) {
    if mask.kind == MaskKind::None {
        return;
    }
    let (w, h) = img.dimensions();
    let cx = (w / 2) as i32;
    let cy = (h / 2) as i32;

    let mut keep = image::GrayImage::new(w, h);
    match mask.kind {
        MaskKind::None => return,
        MaskKind::Rect => {
            // anything wider than the frame keeps the whole axis
            let mw = mask.width.min(w);
            let mh = mask.height.min(h);
            if mw > 0 && mh > 0 {
                let x0 = cx - (mw / 2) as i32;
                let y0 = cy - (mh / 2) as i32;
                let roi = Rect::at(x0, y0).of_size(mw, mh);
                draw_filled_rect_mut(&mut keep, roi, Luma([255u8]));
            }
        }
        MaskKind::Circle => {
            // w + h already reaches every corner from the center
            let radius = (mask.diameter() / 2).min(w.saturating_add(h)) as i32;
            draw_filled_circle_mut(&mut keep, (cx, cy), radius, Luma([255u8]));
        }
    }

    for (px, m) in img.pixels_mut().zip(keep.pixels()) {
        for c in px.0.iter_mut() {
            *c &= m.0[0];
        }
    }
}
