//! Size filtering, scoring and winner selection.

use std::cmp::Ordering;

use nalgebra::Point2;
use pocket_align_core::{DetectionProfile, ShapeMethod};

use crate::contours::ContourStats;
use crate::result::Candidate;

/// Score of a candidate sitting exactly on the image center.
pub const SCORE_BASE: f64 = 10_000.0;

/// Inclusive size filters for the profile's shape method.
///
/// Circle profiles check the diameter (bounding-box width) and leave the
/// height unconstrained.
pub fn passes_filters(profile: &DetectionProfile, stats: &ContourStats) -> bool {
    let f = &profile.filter;
    if stats.area < f.min_area || stats.area > f.max_area {
        return false;
    }
    let w = stats.bbox.width;
    let h = stats.bbox.height;
    match profile.method {
        ShapeMethod::Rect => {
            (f.min_width..=f.max_width).contains(&w) && (f.min_height..=f.max_height).contains(&h)
        }
        ShapeMethod::Circle => (f.min_diameter..=f.max_diameter).contains(&w),
    }
}

/// `SCORE_BASE - |center - image_center|`.
pub fn score_candidate(center: Point2<f64>, image_center: Point2<f64>) -> f64 {
    SCORE_BASE - nalgebra::distance(&center, &image_center)
}

/// Index of the best accepted candidate.
///
/// Higher score wins. Equal scores go to the box whose top edge is higher,
/// then whose left edge is further left.
pub fn select_best(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.accepted)
        .min_by(|(_, a), (_, b)| rank(a, b))
        .map(|(i, _)| i)
}

fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.bbox.y.cmp(&b.bbox.y))
        .then(a.bbox.x.cmp(&b.bbox.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::BoundingBox;

    fn stats(w: u32, h: u32, area: f64) -> ContourStats {
        ContourStats {
            bbox: BoundingBox {
                x: 0,
                y: 0,
                width: w,
                height: h,
            },
            area,
        }
    }

    fn cand(x: u32, y: u32, score: f64, accepted: bool) -> Candidate {
        let bbox = BoundingBox {
            x,
            y,
            width: 4,
            height: 4,
        };
        Candidate {
            bbox,
            area: 9.0,
            center: bbox.center(),
            accepted,
            score,
        }
    }

    #[test]
    fn area_bounds_are_inclusive() {
        let mut p = DetectionProfile::new("p");
        p.filter.min_area = 100.0;
        p.filter.max_area = 200.0;
        assert!(passes_filters(&p, &stats(20, 20, 100.0)));
        assert!(passes_filters(&p, &stats(20, 20, 200.0)));
        assert!(!passes_filters(&p, &stats(20, 20, 99.0)));
        assert!(!passes_filters(&p, &stats(20, 20, 201.0)));
    }

    #[test]
    fn rect_checks_width_and_height() {
        let mut p = DetectionProfile::new("p");
        p.filter.min_width = 10;
        p.filter.max_width = 20;
        p.filter.min_height = 5;
        p.filter.max_height = 8;
        assert!(passes_filters(&p, &stats(10, 8, 150.0)));
        assert!(!passes_filters(&p, &stats(21, 8, 150.0)));
        assert!(!passes_filters(&p, &stats(15, 9, 150.0)));
    }

    #[test]
    fn circle_checks_diameter_only() {
        let mut p = DetectionProfile::new("p");
        p.method = ShapeMethod::Circle;
        p.filter.min_diameter = 12;
        p.filter.max_diameter = 14;
        p.filter.max_height = 1;
        assert!(passes_filters(&p, &stats(13, 300, 150.0)));
        assert!(!passes_filters(&p, &stats(15, 13, 150.0)));
    }

    #[test]
    fn score_decreases_with_distance() {
        let c = Point2::new(50.0, 50.0);
        assert_eq!(score_candidate(c, c), SCORE_BASE);
        assert_eq!(score_candidate(Point2::new(53.0, 54.0), c), SCORE_BASE - 5.0);
    }

    #[test]
    fn best_ignores_rejected_and_breaks_ties_in_raster_order() {
        let cs = [
            cand(40, 10, 9_990.0, true),
            cand(10, 10, 9_990.0, true),
            cand(0, 0, 9_999.0, false),
            cand(5, 30, 9_990.0, true),
        ];
        assert_eq!(select_best(&cs), Some(1));
        assert_eq!(select_best(&cs[2..3]), None);
        assert_eq!(select_best(&[]), None);
    }
}
