use image::{imageops, DynamicImage, RgbImage};
use log::debug;
use pocket_align_core::DetectionProfile;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::adjust::{adjust_brightness_contrast, apply_center_mask};
use crate::binarize::{blur_gray, threshold};
use crate::candidate::{passes_filters, score_candidate, select_best};
use crate::contours::external_contours;
use crate::overlay::{binary_to_rgb, mark_rejected, mark_winner};
use crate::result::{Candidate, DetectionResult};

/// Stateless profile-driven pocket detector. No hardware dependency.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetectionEngine;

impl DetectionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the full pipeline on `image` with `profile`.
    ///
    /// Returns `found == false` with no center when no contour survives the
    /// size filters. Overlays are always produced.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image, profile),
            fields(width = image.width(), height = image.height(), profile = %profile.name)
        )
    )]
    pub fn process(&self, image: &RgbImage, profile: &DetectionProfile) -> DetectionResult {
        let mut work = if profile.is_identity_adjustment() {
            image.clone()
        } else {
            adjust_brightness_contrast(image, profile.contrast_gain(), profile.brightness)
        };
        apply_center_mask(&mut work, &profile.mask);

        let mut gray = imageops::grayscale(&work);
        if let Some(kernel) = profile.blur_kernel() {
            gray = blur_gray(&gray, kernel);
        }
        let binary = threshold(&gray, &profile.threshold);

        let (width, height) = image.dimensions();
        let image_center = nalgebra::Point2::new(width as f64 / 2.0, height as f64 / 2.0);

        let candidates: Vec<Candidate> = external_contours(&binary)
            .into_iter()
            .map(|stats| {
                let center = stats.bbox.center();
                let accepted = passes_filters(profile, &stats);
                Candidate {
                    bbox: stats.bbox,
                    area: stats.area,
                    center,
                    accepted,
                    score: if accepted {
                        score_candidate(center, image_center)
                    } else {
                        0.0
                    },
                }
            })
            .collect();
        let best = select_best(&candidates);

        let mut overlay = image.clone();
        let mut binary_overlay = binary_to_rgb(&binary);
        for c in candidates.iter().filter(|c| !c.accepted) {
            mark_rejected(&mut overlay, &c.bbox);
            mark_rejected(&mut binary_overlay, &c.bbox);
        }
        let center = best.map(|i| candidates[i].center);
        if let Some(i) = best {
            let winner = &candidates[i];
            mark_winner(&mut overlay, &winner.bbox, winner.center);
            mark_winner(&mut binary_overlay, &winner.bbox, winner.center);
        }

        debug!(
            "profile '{}': {} contour(s), {} accepted, winner {:?}",
            profile.name,
            candidates.len(),
            candidates.iter().filter(|c| c.accepted).count(),
            center
        );

        DetectionResult {
            found: best.is_some(),
            center,
            best,
            candidates,
            image_width: width,
            image_height: height,
            overlay,
            binary_overlay,
        }
    }

    /// Convenience wrapper for any decoded image; converts to RGB first.
    pub fn process_dynamic(
        &self,
        image: &DynamicImage,
        profile: &DetectionProfile,
    ) -> DetectionResult {
        self.process(&image.to_rgb8(), profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{ACCEPTED, REJECTED};
    use image::Rgb;
    use pocket_align_core::{MaskKind, MaskSpec};

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([0, 0, 0]))
    }

    fn fill(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, v: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Rgb([v, v, v]));
            }
        }
    }

    #[test]
    fn nothing_found_on_empty_image() {
        let res = DetectionEngine::new().process(&blank(64, 48), &DetectionProfile::new("p"));
        assert!(!res.found);
        assert!(res.center.is_none());
        assert!(res.candidates.is_empty());
        assert_eq!(res.overlay.dimensions(), (64, 48));
        assert_eq!(res.binary_overlay.dimensions(), (64, 48));
    }

    #[test]
    fn closest_to_center_wins_and_rejects_are_marked() {
        let mut img = blank(200, 100);
        fill(&mut img, 20, 40, 20, 20, 255); // off-center
        fill(&mut img, 95, 45, 16, 12, 255); // near center
        fill(&mut img, 150, 10, 3, 3, 255); // too small
        let res = DetectionEngine::new().process(&img, &DetectionProfile::new("p"));
        assert!(res.found);
        let best = res.best_candidate().expect("winner");
        assert_eq!(best.bbox.x, 95);
        assert_eq!(res.accepted_count(), 2);
        assert_eq!(res.candidates.len(), 3);
        assert_eq!(*res.overlay.get_pixel(150, 10), REJECTED);
        assert_eq!(*res.binary_overlay.get_pixel(150, 10), REJECTED);
        assert_eq!(*res.overlay.get_pixel(95, 45), ACCEPTED);
    }

    #[test]
    fn inverted_threshold_finds_dark_pocket_on_bright_tape() {
        let mut img = RgbImage::from_pixel(120, 120, Rgb([230, 230, 230]));
        fill(&mut img, 50, 52, 20, 14, 20);
        let mut p = DetectionProfile::new("dark");
        p.threshold.invert = true;
        let res = DetectionEngine::new().process(&img, &p);
        assert!(res.found, "{:?}", res.candidates);
        let c = res.center.expect("center");
        assert!((c.x - 60.0).abs() <= 1.0);
        assert!((c.y - 59.0).abs() <= 1.0);
    }

    #[test]
    fn contrast_can_push_a_dim_shape_over_the_threshold() {
        let mut img = blank(80, 80);
        fill(&mut img, 30, 30, 20, 20, 80);
        let mut p = DetectionProfile::new("dim");
        assert!(!DetectionEngine::new().process(&img, &p).found);
        p.contrast = 100.0;
        assert!(DetectionEngine::new().process(&img, &p).found);
        p.contrast = 0.0;
        p.brightness = 30.0;
        assert!(DetectionEngine::new().process(&img, &p).found);
    }

    #[test]
    fn mask_hides_shapes_outside_the_window() {
        let mut img = blank(100, 100);
        fill(&mut img, 2, 2, 20, 20, 255);
        let mut p = DetectionProfile::new("masked");
        assert!(DetectionEngine::new().process(&img, &p).found);
        p.mask = MaskSpec {
            kind: MaskKind::Circle,
            width: 50,
            height: 0,
        };
        assert!(!DetectionEngine::new().process(&img, &p).found);
    }
}
