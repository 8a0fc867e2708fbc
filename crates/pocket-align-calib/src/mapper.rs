//! Pixel to machine coordinate conversion.
//!
//! Image Y grows downwards while machine Y grows away from the operator, so
//! the Y axis flips. Z and rotation never come from the image.

use nalgebra::Vector2;
use pocket_align_core::Location;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    /// Millimetres per pixel along image X and Y.
    pub units_per_pixel: Vector2<f64>,
}

impl CoordinateMapper {
    pub fn new(units_per_pixel: Vector2<f64>) -> Self {
        Self { units_per_pixel }
    }

    /// Machine-space delta for a pixel delta.
    pub fn world_delta(&self, pixel: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            pixel.x * self.units_per_pixel.x,
            -pixel.y * self.units_per_pixel.y,
        )
    }

    /// Machine X/Y of a feature seen `pixel` away from the image center while
    /// the camera sat at `search`.
    pub fn world_position(&self, search: &Location, pixel: Vector2<f64>) -> Vector2<f64> {
        let d = self.world_delta(pixel);
        Vector2::new(search.x + d.x, search.y + d.y)
    }

    /// Pocket offset relative to `base`; Z and rotation come from `previous`
    /// (zero when there was none).
    pub fn pocket_offset(
        &self,
        search: &Location,
        base: &Location,
        pixel: Vector2<f64>,
        previous: Option<&Location>,
    ) -> Location {
        let world = self.world_position(search, pixel);
        let keep = previous.copied().unwrap_or(Location::ORIGIN);
        keep.with_xy(world.x - base.x, world.y - base.y)
    }
}
