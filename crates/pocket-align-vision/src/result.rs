use image::RgbImage;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel bounding box. `width`/`height` count pixels, so a single
/// pixel has size 1x1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Box center, `(x + w/2, y + h/2)`.
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// One contour after filtering and scoring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub bbox: BoundingBox,
    /// Polygon area of the contour, in square pixels.
    pub area: f64,
    pub center: Point2<f64>,
    /// `true` when the candidate passed every size filter.
    pub accepted: bool,
    /// Center-distance score; only meaningful for accepted candidates.
    pub score: f64,
}

/// Output of one detection run. Never persisted.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub found: bool,
    /// Pixel center of the winning candidate.
    pub center: Option<Point2<f64>>,
    /// Index of the winner in `candidates`.
    pub best: Option<usize>,
    /// Every external contour, accepted or not, in discovery order.
    pub candidates: Vec<Candidate>,
    pub image_width: u32,
    pub image_height: u32,
    /// Source image with rejected (red) and winning (green) annotations.
    pub overlay: RgbImage,
    /// Binarized image with the same annotations.
    pub binary_overlay: RgbImage,
}

impl DetectionResult {
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.best.and_then(|i| self.candidates.get(i))
    }

    pub fn image_center(&self) -> Point2<f64> {
        Point2::new(
            self.image_width as f64 / 2.0,
            self.image_height as f64 / 2.0,
        )
    }

    /// Winner position relative to the image center, in pixels (+y is down).
    pub fn pixel_offset(&self) -> Option<Vector2<f64>> {
        self.center.map(|c| c - self.image_center())
    }

    pub fn accepted_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.accepted).count()
    }
}
