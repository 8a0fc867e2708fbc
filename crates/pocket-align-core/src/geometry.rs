use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Machine-space location in millimetres (X, Y, Z) plus rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl Location {
    pub const ORIGIN: Location = Location {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        rotation: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64, rotation: f64) -> Self {
        Self { x, y, z, rotation }
    }

    /// Planar location with zero Z and rotation.
    pub fn xy(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    /// Replace X/Y, keeping this location's Z and rotation.
    pub fn with_xy(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }

    /// `true` when X and Y are both exactly zero.
    ///
    /// Feeders and slots that were never configured sit at the origin.
    pub fn is_unset(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, rhs: Location) -> Location {
        Location {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
            rotation: self.rotation + rhs.rotation,
        }
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, rhs: Location) -> Location {
        Location {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
            rotation: self.rotation - rhs.rotation,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "X={:.3} Y={:.3} Z={:.3} R={:.3}",
            self.x, self.y, self.z, self.rotation
        )
    }
}
