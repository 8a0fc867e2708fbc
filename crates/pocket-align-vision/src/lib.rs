//! Pocket detector built on plain thresholding and contour analysis.
//!
//! ## Quickstart
//!
//! ```
//! use image::{Rgb, RgbImage};
//! use pocket_align_core::DetectionProfile;
//! use pocket_align_vision::DetectionEngine;
//!
//! let mut img = RgbImage::new(120, 80);
//! for y in 30..50 {
//!     for x in 50..70 {
//!         img.put_pixel(x, y, Rgb([255, 255, 255]));
//!     }
//! }
//! let result = DetectionEngine::new().process(&img, &DetectionProfile::new("demo"));
//! assert!(result.found);
//! ```
//!
//! Pipeline, one profile at a time:
//! 1. Software brightness/contrast (`p * (1 + contrast/100) + brightness`).
//! 2. Optional rectangle/circle mask centered on the image.
//! 3. Grayscale, optional odd-kernel Gaussian blur.
//! 4. Global threshold (binary or inverted).
//! 5. External contours -> bounding box + polygon area.
//! 6. Size filters (area always; width/height for rect, diameter for circle).
//! 7. Score by distance to the image center; the closest survivor wins.

mod adjust;
mod binarize;
mod candidate;
mod contours;
mod engine;
mod overlay;
mod result;

pub use adjust::{adjust_brightness_contrast, apply_center_mask};
pub use binarize::{blur_gray, sigma_for_kernel, threshold};
pub use candidate::{passes_filters, score_candidate, select_best, SCORE_BASE};
pub use contours::{external_contours, ContourStats};
pub use engine::DetectionEngine;
pub use result::{BoundingBox, Candidate, DetectionResult};
