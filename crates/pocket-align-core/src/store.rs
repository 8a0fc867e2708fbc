//! Persistent profile collection and part-to-profile mappings.
//!
//! The store lives in one human-editable TOML file:
//!
//! ```toml
//! [[profiles]]
//! name = "Default Rect"
//! method = "rect"
//! blur_size = 0
//!
//! [profiles.threshold]
//! low = 100
//! high = 255
//! invert = false
//!
//! [[mappings]]
//! pattern = "C0402"
//! profile = "Default Rect"
//! ```
//!
//! The file is read wholesale on [`ProfileStore::open`] and rewritten
//! wholesale after every mutation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::profile::{DetectionProfile, ProfileError};

/// Name of the profile seeded into an empty store.
pub const DEFAULT_PROFILE_NAME: &str = "Default Rect";

const STORE_DIR: &str = ".pocket_align";
const STORE_FILE: &str = "profiles.toml";

/// Maps a part identifier pattern to a profile name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartMapping {
    pub pattern: String,
    pub profile: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    profiles: Vec<DetectionProfile>,
    #[serde(default)]
    mappings: Vec<PartMapping>,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed profile store: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot encode profile store: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid profile '{name}': {source}")]
    InvalidProfile {
        name: String,
        #[source]
        source: ProfileError,
    },
}

/// Name-keyed detection profiles plus ordered part mappings.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    path: Option<PathBuf>,
    profiles: BTreeMap<String, DetectionProfile>,
    mappings: Vec<PartMapping>,
}

impl ProfileStore {
    /// Store that never touches the filesystem. Seeded with the default profile.
    pub fn in_memory() -> Self {
        let mut store = Self {
            path: None,
            profiles: BTreeMap::new(),
            mappings: Vec::new(),
        };
        store.seed_default();
        store
    }

    /// `$HOME/.pocket_align/profiles.toml`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(STORE_DIR).join(STORE_FILE))
    }

    /// Load the store from `path`.
    ///
    /// A missing file is treated as an empty store. An empty store is seeded
    /// with [`DEFAULT_PROFILE_NAME`] and written back immediately. A file that
    /// exists but cannot be parsed is an error and is left untouched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str::<StoreFile>(&raw)?
        } else {
            StoreFile::default()
        };

        let mut profiles = BTreeMap::new();
        for profile in file.profiles {
            if profiles.contains_key(&profile.name) {
                warn!(
                    "duplicate profile '{}' in {}; keeping the last one",
                    profile.name,
                    path.display()
                );
            }
            profiles.insert(profile.name.clone(), profile);
        }

        let mut store = Self {
            path: Some(path),
            profiles,
            mappings: file.mappings,
        };
        if store.profiles.is_empty() {
            store.seed_default();
            store.persist()?;
        }
        info!(
            "loaded {} profile(s), {} mapping(s)",
            store.profiles.len(),
            store.mappings.len()
        );
        Ok(store)
    }

    fn seed_default(&mut self) {
        info!("seeding profile store with '{DEFAULT_PROFILE_NAME}'");
        self.profiles.insert(
            DEFAULT_PROFILE_NAME.to_string(),
            DetectionProfile::new(DEFAULT_PROFILE_NAME),
        );
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn profile(&self, name: &str) -> Option<&DetectionProfile> {
        self.profiles.get(name)
    }

    /// Profiles in name order.
    pub fn profiles(&self) -> impl Iterator<Item = &DetectionProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Insert or replace a profile by name, then persist.
    pub fn save_profile(&mut self, profile: DetectionProfile) -> Result<(), StoreError> {
        profile
            .validate()
            .map_err(|source| StoreError::InvalidProfile {
                name: profile.name.clone(),
                source,
            })?;
        self.profiles.insert(profile.name.clone(), profile);
        self.persist()
    }

    /// Remove a profile. Mappings that point at it are kept and will simply
    /// fail to resolve. Returns `false` if no such profile existed.
    pub fn delete_profile(&mut self, name: &str) -> Result<bool, StoreError> {
        if self.profiles.remove(name).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn mappings(&self) -> &[PartMapping] {
        &self.mappings
    }

    /// Look up the profile name mapped to `id`.
    ///
    /// An exact pattern match wins. Otherwise the longest pattern contained in
    /// `id` is used, with earlier mappings winning ties.
    pub fn mapping(&self, id: &str) -> Option<&str> {
        if id.is_empty() {
            return None;
        }
        if let Some(m) = self.mappings.iter().find(|m| m.pattern == id) {
            return Some(&m.profile);
        }
        let mut best: Option<&PartMapping> = None;
        for m in &self.mappings {
            if m.pattern.is_empty() || !id.contains(m.pattern.as_str()) {
                continue;
            }
            if best.is_none_or(|b| m.pattern.len() > b.pattern.len()) {
                best = Some(m);
            }
        }
        best.map(|m| m.profile.as_str())
    }

    /// Resolve the profile name for a part, trying its id before its name.
    pub fn resolve_for_part(&self, part_id: &str, part_name: &str) -> Option<&str> {
        self.mapping(part_id).or_else(|| self.mapping(part_name))
    }

    /// Map `pattern` to `profile`, replacing an existing mapping for the same
    /// pattern in place. Persists.
    pub fn set_mapping(
        &mut self,
        pattern: impl Into<String>,
        profile: impl Into<String>,
    ) -> Result<(), StoreError> {
        let pattern = pattern.into();
        let profile = profile.into();
        match self.mappings.iter_mut().find(|m| m.pattern == pattern) {
            Some(existing) => existing.profile = profile,
            None => self.mappings.push(PartMapping { pattern, profile }),
        }
        self.persist()
    }

    /// Remove the mapping for `pattern`. Returns `false` if there was none.
    pub fn remove_mapping(&mut self, pattern: &str) -> Result<bool, StoreError> {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.pattern != pattern);
        if self.mappings.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Rewrite the backing file. No-op for in-memory stores.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let file = StoreFile {
            profiles: self.profiles.values().cloned().collect(),
            mappings: self.mappings.clone(),
        };
        let text = toml::to_string_pretty(&file)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, text)?;
        Ok(())
    }
}
