//! Grayscale smoothing and global thresholding.

use image::{GrayImage, ImageBuffer, Luma};
use pocket_align_core::ThresholdSpec;

/// Gaussian sigma for an odd kernel size, matching the usual
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` rule for "sigma from kernel".
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Blur a gray image with a Gaussian of the given odd kernel size.
///
/// Kernels of size `<= 1` return the input unchanged.
pub fn blur_gray(img: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 {
        return img.clone();
    }
    let sigma = sigma_for_kernel(kernel);
    let (w, h) = img.dimensions();
    let mut f = ImageBuffer::<Luma<f32>, Vec<f32>>::new(w, h);
    for (dst, src) in f.pixels_mut().zip(img.pixels()) {
        dst.0[0] = src.0[0] as f32 / 255.0;
    }
    let blurred = imageproc::filter::gaussian_blur_f32(&f, sigma);
    let mut out = GrayImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(blurred.pixels()) {
        dst.0[0] = (src.0[0].clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out
}

/// Global threshold.
///
/// Binary: `p > low -> high`, else `0`. Inverted: `p > low -> 0`, else `high`.
pub fn threshold(img: &GrayImage, spec: &ThresholdSpec) -> GrayImage {
    let (on, off) = if spec.invert {
        (0u8, spec.high)
    } else {
        (spec.high, 0u8)
    };
    let mut out = img.clone();
    for px in out.pixels_mut() {
        px.0[0] = if px.0[0] > spec.low { on } else { off };
    }
    out
}
