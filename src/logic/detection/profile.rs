//! Class Profiles
//!
//! Per-class geometric acceptance envelopes. The table is runtime data:
//! adding a class means adding an entry, not a code path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// CLASS PROFILE
// ============================================================================

/// Geometric envelope for one class label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProfile {
    /// Minimum pixel area (inclusive)
    pub area_min: u32,
    /// Maximum pixel area (inclusive)
    pub area_max: u32,
    /// Minimum long/short side ratio (inclusive, >= 1.0)
    pub ratio_min: f32,
    /// Maximum long/short side ratio (inclusive)
    pub ratio_max: f32,
    /// Overlay color (RGB), display only
    #[serde(default = "default_color")]
    pub color: (u8, u8, u8),
}

/// Overlay color for profiles that do not set one
pub const DEFAULT_COLOR: (u8, u8, u8) = (255, 255, 255);

fn default_color() -> (u8, u8, u8) {
    DEFAULT_COLOR
}

impl ClassProfile {
    pub const fn new(area_min: u32, area_max: u32, ratio_min: f32, ratio_max: f32) -> Self {
        Self {
            area_min,
            area_max,
            ratio_min,
            ratio_max,
            color: DEFAULT_COLOR,
        }
    }

    pub const fn with_color(self, color: (u8, u8, u8)) -> Self {
        Self { color, ..self }
    }

    /// Check the envelope invariants, returning a reason when broken
    pub fn check(&self) -> Result<(), String> {
        if self.area_min >= self.area_max {
            return Err(format!(
                "area_min ({}) must be below area_max ({})",
                self.area_min, self.area_max
            ));
        }
        if !self.ratio_min.is_finite() || !self.ratio_max.is_finite() {
            return Err("ratio bounds must be finite".to_string());
        }
        if self.ratio_min < 1.0 {
            return Err(format!("ratio_min ({}) must be >= 1.0", self.ratio_min));
        }
        if self.ratio_min > self.ratio_max {
            return Err(format!(
                "ratio_min ({}) must not exceed ratio_max ({})",
                self.ratio_min, self.ratio_max
            ));
        }
        Ok(())
    }

    pub fn accepts_area(&self, area: i64) -> bool {
        area >= self.area_min as i64 && area <= self.area_max as i64
    }

    pub fn accepts_ratio(&self, ratio: f32) -> bool {
        ratio >= self.ratio_min && ratio <= self.ratio_max
    }
}

// ============================================================================
// DEFAULT PROFILES
// ============================================================================

/// Passenger cars, vans, pickups
pub const LIGHT: ClassProfile = ClassProfile::new(800, 18_000, 1.0, 3.5).with_color((255, 200, 50));

/// Trucks and buses
pub const HEAVY: ClassProfile = ClassProfile::new(2_000, 60_000, 1.5, 6.0).with_color((255, 140, 0));

pub const MOTORCYCLE: ClassProfile = ClassProfile::new(100, 2_500, 1.2, 4.0).with_color((220, 100, 255));

pub const BICYCLE: ClassProfile = ClassProfile::new(150, 1_500, 1.8, 5.0).with_color((200, 255, 0));

// ============================================================================
// PROFILE TABLE
// ============================================================================

/// Label -> profile lookup. Labels are stored and matched lower-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, ClassProfile>", into = "HashMap<String, ClassProfile>")]
pub struct ProfileTable {
    profiles: HashMap<String, ClassProfile>,
}

impl ProfileTable {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn insert(&mut self, label: &str, profile: ClassProfile) {
        self.profiles.insert(label.to_lowercase(), profile);
    }

    /// Look up a profile by class label (case-insensitive)
    pub fn get(&self, label: &str) -> Option<&ClassProfile> {
        match self.profiles.get(label) {
            Some(p) => Some(p),
            None => self.profiles.get(&label.to_lowercase()),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClassProfile)> {
        self.profiles.iter()
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("light", LIGHT);
        table.insert("heavy", HEAVY);
        table.insert("motorcycle", MOTORCYCLE);
        table.insert("bicycle", BICYCLE);
        table
    }
}

impl From<HashMap<String, ClassProfile>> for ProfileTable {
    fn from(map: HashMap<String, ClassProfile>) -> Self {
        let mut table = Self::empty();
        for (label, profile) in map {
            table.insert(&label, profile);
        }
        table
    }
}

impl From<ProfileTable> for HashMap<String, ClassProfile> {
    fn from(table: ProfileTable) -> Self {
        table.profiles
    }
}

// ============================================================================
// TESTS
// ============================================================================
