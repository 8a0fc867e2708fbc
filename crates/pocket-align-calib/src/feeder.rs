use pocket_align_core::Location;
use serde::{Deserialize, Serialize};

use crate::machine::Part;

/// Named mounting slot a feeder sits in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub location: Location,
}

/// Feeder as far as calibration is concerned.
///
/// Calibration rewrites `location` (or the slot's location), `offset` and
/// `enabled`; every other field is read-only here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feeder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub part: Option<Part>,
    pub location: Location,
    /// Pocket position relative to the base location.
    #[serde(default)]
    pub offset: Option<Location>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub slot: Option<Slot>,
}

/// Which record a fiducial refinement was written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseTarget {
    Slot,
    Feeder,
}

impl Feeder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            part: None,
            location,
            offset: None,
            enabled: false,
            slot: None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unnamed"
        } else {
            &self.name
        }
    }

    /// Slot location for slot-mounted feeders, the feeder's own otherwise.
    pub fn base_location(&self) -> Location {
        self.slot
            .as_ref()
            .map_or(self.location, |slot| slot.location)
    }

    /// Where the camera looks for the pocket: base plus the current offset.
    pub fn search_location(&self) -> Location {
        self.base_location() + self.offset.unwrap_or(Location::ORIGIN)
    }

    /// Write a refined X/Y to the slot (or the feeder when it has none),
    /// keeping the record's Z and rotation.
    pub fn set_base_xy(&mut self, found: &Location) -> BaseTarget {
        match self.slot.as_mut() {
            Some(slot) => {
                slot.location = slot.location.with_xy(found.x, found.y);
                BaseTarget::Slot
            }
            None => {
                self.location = self.location.with_xy(found.x, found.y);
                BaseTarget::Feeder
            }
        }
    }
}

/// Enabled feeders whose name contains `name_filter` (all enabled ones when
/// the filter is `None` or empty), in their original order.
pub fn select_feeders(feeders: &[Feeder], name_filter: Option<&str>) -> Vec<Feeder> {
    let filter = name_filter.filter(|f| !f.is_empty());
    feeders
        .iter()
        .filter(|f| f.enabled)
        .filter(|f| filter.is_none_or(|needle| f.name.contains(needle)))
        .cloned()
        .collect()
}
