//! Debug annotations on the color and binary overlays.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use nalgebra::Point2;

use crate::result::BoundingBox;

pub(crate) const REJECTED: Rgb<u8> = Rgb([255, 0, 0]);
pub(crate) const ACCEPTED: Rgb<u8> = Rgb([0, 255, 0]);

const CROSSHAIR_HALF: f32 = 10.0;

fn rect_of(bbox: &BoundingBox) -> Rect {
    Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width.max(1), bbox.height.max(1))
}

/// 1 px red outline.
pub(crate) fn mark_rejected(img: &mut RgbImage, bbox: &BoundingBox) {
    draw_hollow_rect_mut(img, rect_of(bbox), REJECTED);
}

/// 2 px green outline plus a crosshair on `center`.
pub(crate) fn mark_winner(img: &mut RgbImage, bbox: &BoundingBox, center: Point2<f64>) {
    draw_hollow_rect_mut(img, rect_of(bbox), ACCEPTED);
    if bbox.width > 2 && bbox.height > 2 {
        let inner = Rect::at(bbox.x as i32 + 1, bbox.y as i32 + 1)
            .of_size(bbox.width - 2, bbox.height - 2);
        draw_hollow_rect_mut(img, inner, ACCEPTED);
    }

    let cx = center.x.trunc() as f32;
    let cy = center.y.trunc() as f32;
    for d in [0.0f32, 1.0] {
        draw_line_segment_mut(
            img,
            (cx - CROSSHAIR_HALF, cy + d),
            (cx + CROSSHAIR_HALF, cy + d),
            ACCEPTED,
        );
        draw_line_segment_mut(
            img,
            (cx + d, cy - CROSSHAIR_HALF),
            (cx + d, cy + CROSSHAIR_HALF),
            ACCEPTED,
        );
    }
}

/// Expand a binary gray image into RGB for annotation.
pub(crate) fn binary_to_rgb(binary: &image::GrayImage) -> RgbImage {
    let (w, h) = binary.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let v = binary.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}
