//! Detection profiles: named image-processing parameters and acceptance filters.

use serde::{Deserialize, Serialize};

/// Shape family a profile looks for. Selects which size filters apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeMethod {
    /// Area plus width and height ranges.
    #[default]
    Rect,
    /// Area plus a diameter range (measured as bounding-box width).
    Circle,
}

/// Spatial mask applied around the image center before thresholding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    #[default]
    None,
    Rect,
    Circle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskSpec {
    pub kind: MaskKind,
    /// Rectangle width, or circle diameter.
    pub width: u32,
    /// Rectangle height. Ignored for circles.
    pub height: u32,
}

impl Default for MaskSpec {
    fn default() -> Self {
        Self {
            kind: MaskKind::None,
            width: 600,
            height: 600,
        }
    }
}

impl MaskSpec {
    #[inline]
    pub fn diameter(&self) -> u32 {
        self.width
    }
}

/// Global threshold settings.
///
/// Pixels brighter than `low` become `high` (or `0` when inverted); all
/// others become `0` (or `high`). `high` is therefore the foreground value
/// written into the binary image, not a second cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSpec {
    pub low: u8,
    pub high: u8,
    pub invert: bool,
}

impl Default for ThresholdSpec {
    fn default() -> Self {
        Self {
            low: 100,
            high: 255,
            invert: false,
        }
    }
}

/// Acceptance ranges for contour candidates, in pixels. All bounds inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeFilter {
    pub min_area: f64,
    pub max_area: f64,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub min_diameter: u32,
    pub max_diameter: u32,
}

impl Default for SizeFilter {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            max_area: 10_000.0,
            min_width: 10,
            max_width: 800,
            min_height: 10,
            max_height: 800,
            min_diameter: 10,
            max_diameter: 500,
        }
    }
}

/// Largest accepted mask width or height, in pixels.
pub const MAX_MASK_SIZE: u32 = 16_384;

/// Largest accepted Gaussian kernel size.
pub const MAX_BLUR_SIZE: u32 = 255;

/// Profile validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("profile name must not be empty")]
    EmptyName,
    #[error("{field}: min ({min}) must not exceed max ({max})")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("mask size must be > 0 (got {width}x{height})")]
    EmptyMask { width: u32, height: u32 },
    #[error("mask size {width}x{height} exceeds {max}")]
    MaskTooLarge { width: u32, height: u32, max: u32 },
    #[error("blur size {size} exceeds {max}")]
    BlurTooLarge { size: u32, max: u32 },
    #[error("brightness/contrast must be finite")]
    NonFiniteAdjustment,
}

/// Named bundle of image-processing parameters for one part shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionProfile {
    pub name: String,
    pub method: ShapeMethod,
    /// Additive software brightness, roughly -100..100.
    pub brightness: f64,
    /// Software contrast in percent, roughly -100..100.
    pub contrast: f64,
    /// Hardware exposure override. Absent or negative means "leave the
    /// camera alone".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_exposure: Option<i32>,
    /// Gaussian kernel size; `0` disables blurring, even sizes are rounded up.
    pub blur_size: u32,
    pub threshold: ThresholdSpec,
    pub mask: MaskSpec,
    pub filter: SizeFilter,
}

impl Default for DetectionProfile {
    fn default() -> Self {
        Self::new("Default")
    }
}

impl DetectionProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: ShapeMethod::Rect,
            brightness: 0.0,
            contrast: 0.0,
            camera_exposure: None,
            blur_size: 0,
            threshold: ThresholdSpec::default(),
            mask: MaskSpec::default(),
            filter: SizeFilter::default(),
        }
    }

    /// Exposure value to force on the camera, if any.
    pub fn exposure_override(&self) -> Option<i32> {
        self.camera_exposure.filter(|v| *v >= 0)
    }

    /// Odd Gaussian kernel size, or `None` when blurring is off.
    pub fn blur_kernel(&self) -> Option<u32> {
        (self.blur_size > 0).then_some(self.blur_size | 1)
    }

    /// Multiplicative gain derived from `contrast`.
    #[inline]
    pub fn contrast_gain(&self) -> f64 {
        1.0 + self.contrast / 100.0
    }

    /// `true` when brightness/contrast leave pixels untouched.
    pub fn is_identity_adjustment(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 0.0
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if !self.brightness.is_finite() || !self.contrast.is_finite() {
            return Err(ProfileError::NonFiniteAdjustment);
        }
        let f = &self.filter;
        check_range("area", f.min_area, f.max_area)?;
        match self.method {
            ShapeMethod::Rect => {
                check_range("width", f.min_width as f64, f.max_width as f64)?;
                check_range("height", f.min_height as f64, f.max_height as f64)?;
            }
            ShapeMethod::Circle => {
                check_range("diameter", f.min_diameter as f64, f.max_diameter as f64)?;
            }
        }
        let m = &self.mask;
        let empty = match m.kind {
            MaskKind::None => false,
            MaskKind::Rect => m.width == 0 || m.height == 0,
            MaskKind::Circle => m.width == 0,
        };
        if empty {
            return Err(ProfileError::EmptyMask {
                width: m.width,
                height: m.height,
            });
        }
        let oversized = match m.kind {
            MaskKind::None => false,
            MaskKind::Rect => m.width > MAX_MASK_SIZE || m.height > MAX_MASK_SIZE,
            MaskKind::Circle => m.width > MAX_MASK_SIZE,
        };
        if oversized {
            return Err(ProfileError::MaskTooLarge {
                width: m.width,
                height: m.height,
                max: MAX_MASK_SIZE,
            });
        }
        if self.blur_size > MAX_BLUR_SIZE {
            return Err(ProfileError::BlurTooLarge {
                size: self.blur_size,
                max: MAX_BLUR_SIZE,
            });
        }
        Ok(())
    }
}

fn check_range(field: &'static str, min: f64, max: f64) -> Result<(), ProfileError> {
    if min > max || !min.is_finite() || !max.is_finite() {
        return Err(ProfileError::InvertedRange { field, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_kernel_is_forced_odd() {
        let mut p = DetectionProfile::new("p");
        assert_eq!(p.blur_kernel(), None);
        p.blur_size = 4;
        assert_eq!(p.blur_kernel(), Some(5));
        p.blur_size = 5;
        assert_eq!(p.blur_kernel(), Some(5));
    }

    #[test]
    fn negative_exposure_means_ignore() {
        let mut p = DetectionProfile::new("p");
        p.camera_exposure = Some(-1);
        assert_eq!(p.exposure_override(), None);
        p.camera_exposure = Some(0);
        assert_eq!(p.exposure_override(), Some(0));
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let mut p = DetectionProfile::new("p");
        p.filter.min_area = 500.0;
        p.filter.max_area = 100.0;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::InvertedRange { field: "area", .. })
        ));
    }

    #[test]
    fn circle_profiles_skip_height_range() {
        let mut p = DetectionProfile::new("round");
        p.method = ShapeMethod::Circle;
        p.filter.min_height = 900;
        p.filter.max_height = 1;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_mask_and_name() {
        let mut p = DetectionProfile::new("  ");
        assert_eq!(p.validate(), Err(ProfileError::EmptyName));
        p.name = "m".into();
        p.mask = MaskSpec {
            kind: MaskKind::Circle,
            width: 0,
            height: 10,
        };
        assert!(matches!(p.validate(), Err(ProfileError::EmptyMask { .. })));
    }

    #[test]
    fn validate_bounds_mask_and_blur_sizes() {
        let mut p = DetectionProfile::new("big");
        p.mask = MaskSpec {
            kind: MaskKind::Circle,
            width: u32::MAX,
            height: 0,
        };
        assert!(matches!(p.validate(), Err(ProfileError::MaskTooLarge { .. })));
        p.mask.kind = MaskKind::Rect;
        p.mask.width = MAX_MASK_SIZE;
        p.mask.height = MAX_MASK_SIZE + 1;
        assert!(matches!(p.validate(), Err(ProfileError::MaskTooLarge { .. })));
        p.mask.height = MAX_MASK_SIZE;
        assert!(p.validate().is_ok());

        // unused mask sizes are not checked
        p.mask = MaskSpec {
            kind: MaskKind::None,
            width: u32::MAX,
            height: u32::MAX,
        };
        assert!(p.validate().is_ok());

        p.blur_size = MAX_BLUR_SIZE + 1;
        assert_eq!(
            p.validate(),
            Err(ProfileError::BlurTooLarge {
                size: MAX_BLUR_SIZE + 1,
                max: MAX_BLUR_SIZE
            })
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let p: DetectionProfile = toml::from_str("name = \"Tape8\"\nmethod = \"circle\"\n")
            .expect("parse");
        assert_eq!(p.name, "Tape8");
        assert_eq!(p.method, ShapeMethod::Circle);
        assert_eq!(p.threshold, ThresholdSpec::default());
        assert_eq!(p.filter, SizeFilter::default());
        assert_eq!(p.camera_exposure, None);
    }
}
