//! Simulated machine: a camera that renders tape pockets relative to its own
//! position, a shared exposure property and a scripted fiducial locator.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use nalgebra::Vector2;
use pocket_align_calib::{
    CancelToken, Camera, ConfigError, ExposureControl, Feeder, FiducialLocator, Footprint,
    HardwareError, LocateError, Machine, Motion, Part, SharedExposure, Slot,
};
use pocket_align_core::{DetectionProfile, Location, ProfileStore};

/// 1/16 mm per pixel keeps every test coordinate exact in binary.
pub const UPP: f64 = 0.0625;
pub const IMAGE_W: u32 = 320;
pub const IMAGE_H: u32 = 240;
pub const POCKET_W: u32 = 24;
pub const POCKET_H: u32 = 16;
pub const PART_ID: &str = "C0603-100N";
pub const REFERENCE: &str = "Fiducial-1mm";

#[derive(Debug)]
pub struct SimExposure {
    pub value: i32,
    pub auto: bool,
}

impl ExposureControl for SimExposure {
    fn value(&self) -> Result<i32, HardwareError> {
        Ok(self.value)
    }
    fn set_value(&mut self, value: i32) -> Result<(), HardwareError> {
        self.value = value;
        Ok(())
    }
    fn is_auto(&self) -> Result<bool, HardwareError> {
        Ok(self.auto)
    }
    fn set_auto(&mut self, auto: bool) -> Result<(), HardwareError> {
        self.auto = auto;
        Ok(())
    }
}

pub struct SimCamera {
    pub position: Location,
    /// Pocket centers in machine coordinates.
    pub pockets: Vec<Vector2<f64>>,
    pub exposure: Option<Arc<Mutex<SimExposure>>>,
    pub fail_capture: bool,
    /// Added to every commanded position, like a mis-homed axis.
    pub landing_error: Vector2<f64>,
    pub moves: Vec<Location>,
    pub safe_moves: usize,
    /// Exposure value seen at each capture.
    pub captured_exposure: Vec<Option<i32>>,
}

impl SimCamera {
    pub fn new() -> Self {
        Self {
            position: Location::ORIGIN,
            pockets: Vec::new(),
            exposure: Some(Arc::new(Mutex::new(SimExposure {
                value: 50,
                auto: false,
            }))),
            fail_capture: false,
            landing_error: Vector2::zeros(),
            moves: Vec::new(),
            safe_moves: 0,
            captured_exposure: Vec::new(),
        }
    }

    pub fn exposure_state(&self) -> Option<(i32, bool)> {
        self.exposure.as_ref().map(|e| {
            let e = e.lock().unwrap();
            (e.value, e.auto)
        })
    }
}

impl Motion for SimCamera {
    fn move_to_safe(&mut self) -> Result<(), HardwareError> {
        self.safe_moves += 1;
        Ok(())
    }

    fn move_to(&mut self, location: &Location, _speed: f64) -> Result<(), HardwareError> {
        self.position = Location {
            x: location.x + self.landing_error.x,
            y: location.y + self.landing_error.y,
            ..*location
        };
        self.moves.push(*location);
        Ok(())
    }
}

impl Camera for SimCamera {
    fn capture(&mut self) -> Result<RgbImage, HardwareError> {
        self.captured_exposure
            .push(self.exposure_state().map(|(value, _)| value));
        if self.fail_capture {
            return Err(HardwareError::Capture("usb reset".into()));
        }
        let mut img = RgbImage::from_pixel(IMAGE_W, IMAGE_H, Rgb([20, 20, 20]));
        for pocket in &self.pockets {
            let px = IMAGE_W as f64 / 2.0 + (pocket.x - self.position.x) / UPP;
            let py = IMAGE_H as f64 / 2.0 - (pocket.y - self.position.y) / UPP;
            let x0 = (px - POCKET_W as f64 / 2.0).round() as i32;
            let y0 = (py - POCKET_H as f64 / 2.0).round() as i32;
            draw_filled_rect_mut(
                &mut img,
                Rect::at(x0, y0).of_size(POCKET_W, POCKET_H),
                Rgb([230, 230, 230]),
            );
        }
        Ok(img)
    }

    fn units_per_pixel(&self) -> Vector2<f64> {
        Vector2::new(UPP, UPP)
    }

    fn location(&self) -> Location {
        self.position
    }

    fn exposure(&self) -> Option<SharedExposure> {
        self.exposure
            .as_ref()
            .map(|e| -> SharedExposure { e.clone() })
    }
}

/// Returns the nominal location plus `correction`, except where scripted.
pub struct SimLocator {
    pub correction: Vector2<f64>,
    pub fail_near_x: Vec<f64>,
    pub miss_near_x: Vec<f64>,
    /// Set the token on this (1-based) call.
    pub cancel_on_call: Option<(usize, CancelToken)>,
    pub calls: Vec<(Location, String)>,
}

impl SimLocator {
    pub fn new(correction: Vector2<f64>) -> Self {
        Self {
            correction,
            fail_near_x: Vec::new(),
            miss_near_x: Vec::new(),
            cancel_on_call: None,
            calls: Vec::new(),
        }
    }
}

fn near(xs: &[f64], x: f64) -> bool {
    xs.iter().any(|v| (v - x).abs() < 1e-9)
}

impl FiducialLocator for SimLocator {
    fn locate(&mut self, nominal: &Location, part: &Part) -> Result<Option<Location>, LocateError> {
        self.calls.push((*nominal, part.name.clone()));
        if let Some((n, token)) = &self.cancel_on_call {
            if self.calls.len() == *n {
                token.set();
            }
        }
        if near(&self.fail_near_x, nominal.x) {
            return Err(LocateError::Vision("template match diverged".into()));
        }
        if near(&self.miss_near_x, nominal.x) {
            return Ok(None);
        }
        Ok(Some(nominal.with_xy(
            nominal.x + self.correction.x,
            nominal.y + self.correction.y,
        )))
    }
}

/// Route the calibrators' `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct SimMachine {
    pub camera: Option<SimCamera>,
    pub locator: Option<SimLocator>,
    pub parts: Vec<Part>,
    pub saves: usize,
    pub fail_save: bool,
}

impl SimMachine {
    pub fn new() -> Self {
        init_logging();
        Self {
            camera: Some(SimCamera::new()),
            locator: Some(SimLocator::new(Vector2::new(0.25, -0.125))),
            parts: vec![
                Part::new("FID-1", REFERENCE).with_footprint(Footprint {
                    body_width: 1.0,
                    body_height: 1.0,
                }),
                Part::new(PART_ID, "100nF 0603"),
            ],
            saves: 0,
            fail_save: false,
        }
    }

    pub fn cam(&self) -> &SimCamera {
        self.camera.as_ref().unwrap()
    }

    pub fn cam_mut(&mut self) -> &mut SimCamera {
        self.camera.as_mut().unwrap()
    }

    pub fn locator(&self) -> &SimLocator {
        self.locator.as_ref().unwrap()
    }

    pub fn locator_mut(&mut self) -> &mut SimLocator {
        self.locator.as_mut().unwrap()
    }
}

impl Machine for SimMachine {
    fn camera(&mut self) -> Option<&mut dyn Camera> {
        self.camera.as_mut().map(|c| c as &mut dyn Camera)
    }

    fn fiducial_locator(&mut self) -> Option<&mut dyn FiducialLocator> {
        self.locator.as_mut().map(|l| l as &mut dyn FiducialLocator)
    }

    fn part(&self, id: &str) -> Option<Part> {
        self.parts.iter().find(|p| p.id == id).cloned()
    }

    fn parts(&self) -> Vec<Part> {
        self.parts.clone()
    }

    fn add_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    fn save_config(&mut self) -> Result<(), ConfigError> {
        if self.fail_save {
            return Err(ConfigError::Rejected("read-only config".into()));
        }
        self.saves += 1;
        Ok(())
    }
}

/// Slot-mounted feeder for the test part, nominal slot at `(x, y)`.
pub fn slot_feeder(n: u32, x: f64, y: f64) -> Feeder {
    let mut f = Feeder::new(format!("F{n}"), format!("Slot: {n}"), Location::xy(x, y));
    f.part = Some(Part::new(PART_ID, "100nF 0603"));
    f.slot = Some(Slot {
        name: format!("S{n}"),
        location: Location::new(x, y, -1.0, 0.0),
    });
    f.offset = Some(Location::new(1.5, 1.0, 0.5, 90.0));
    f
}

/// Store with the default profile mapped to the test part.
pub fn mapped_store() -> ProfileStore {
    let mut store = ProfileStore::in_memory();
    store
        .set_mapping(PART_ID, pocket_align_core::DEFAULT_PROFILE_NAME)
        .unwrap();
    store
}

/// Store whose mapped profile forces hardware exposure to `value`.
pub fn exposure_store(value: i32) -> ProfileStore {
    let mut store = ProfileStore::in_memory();
    let mut profile = DetectionProfile::new("White tape");
    profile.camera_exposure = Some(value);
    store.save_profile(profile).unwrap();
    store.set_mapping(PART_ID, "White tape").unwrap();
    store
}
