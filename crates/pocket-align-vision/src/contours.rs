//! External contour extraction and per-contour measurements.

use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::result::BoundingBox;

/// Geometry of one outer border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContourStats {
    pub bbox: BoundingBox,
    /// Shoelace area of the polygon through the border pixel centers.
    ///
    /// A filled `w x h` rectangle measures `(w - 1) * (h - 1)`.
    pub area: f64,
}

/// Top-level outer borders of the non-zero regions in `binary`.
///
/// Holes and anything nested inside a hole are ignored. Contours come back in
/// raster order of their first (top-most, then left-most) pixel. Regions
/// touching the image border are reported like any other.
pub fn external_contours(binary: &GrayImage) -> Vec<ContourStats> {
    // border following needs a background frame around every region
    let (w, h) = binary.dimensions();
    let mut padded = GrayImage::new(w + 2, h + 2);
    imageops::replace(&mut padded, binary, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<Point<i32>> =
                c.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
            measure(&points)
        })
        .collect()
}

fn measure(points: &[Point<i32>]) -> Option<ContourStats> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let bbox = BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    };
    Some(ContourStats {
        bbox,
        area: polygon_area(points),
    })
}

fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn filled_rectangle_measures_bbox_and_area() {
        let mut img = GrayImage::new(40, 30);
        fill(&mut img, 5, 7, 12, 9);
        let cs = external_contours(&img);
        assert_eq!(cs.len(), 1);
        assert_eq!(
            cs[0].bbox,
            BoundingBox {
                x: 5,
                y: 7,
                width: 12,
                height: 9
            }
        );
        assert_eq!(cs[0].area, 11.0 * 8.0);
    }

    #[test]
    fn holes_and_nested_islands_are_not_external() {
        let mut img = GrayImage::new(40, 40);
        fill(&mut img, 2, 2, 30, 30);
        // carve a hole, then put an island inside it
        for y in 8..26 {
            for x in 8..26 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        fill(&mut img, 14, 14, 4, 4);
        let cs = external_contours(&img);
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].bbox.width, 30);
    }

    #[test]
    fn contours_come_back_in_raster_order() {
        let mut img = GrayImage::new(50, 50);
        fill(&mut img, 30, 5, 5, 5);
        fill(&mut img, 2, 20, 5, 5);
        fill(&mut img, 10, 5, 5, 5);
        let xs: Vec<(u32, u32)> = external_contours(&img)
            .iter()
            .map(|c| (c.bbox.y, c.bbox.x))
            .collect();
        assert_eq!(xs, vec![(5, 10), (5, 30), (20, 2)]);
    }

    #[test]
    fn shapes_touching_each_edge_are_found() {
        let mut img = GrayImage::new(120, 120);
        fill(&mut img, 0, 40, 30, 30); // left
        fill(&mut img, 100, 45, 20, 20); // right
        fill(&mut img, 45, 0, 25, 15); // top
        fill(&mut img, 50, 105, 10, 15); // bottom
        let mut boxes: Vec<BoundingBox> = external_contours(&img).iter().map(|c| c.bbox).collect();
        boxes.sort_by_key(|b| (b.x, b.y));
        let bb = |x: u32, y: u32, width: u32, height: u32| BoundingBox {
            x,
            y,
            width,
            height,
        };
        assert_eq!(
            boxes,
            vec![
                bb(0, 40, 30, 30),
                bb(45, 0, 25, 15),
                bb(50, 105, 10, 15),
                bb(100, 45, 20, 20),
            ]
        );
    }

    #[test]
    fn flooded_image_is_one_full_frame_contour() {
        let mut img = GrayImage::new(16, 12);
        fill(&mut img, 0, 0, 16, 12);
        let cs = external_contours(&img);
        assert_eq!(cs.len(), 1);
        assert_eq!(
            cs[0].bbox,
            BoundingBox {
                x: 0,
                y: 0,
                width: 16,
                height: 12
            }
        );
        assert_eq!(cs[0].area, 15.0 * 11.0);
    }

    #[test]
    fn empty_image_has_no_contours() {
        assert!(external_contours(&GrayImage::new(10, 10)).is_empty());
    }

    #[test]
    fn degenerate_shapes_have_zero_area() {
        let mut img = GrayImage::new(10, 10);
        fill(&mut img, 4, 4, 1, 1);
        let cs = external_contours(&img);
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].area, 0.0);
        assert_eq!(cs[0].bbox.width, 1);
    }
}
