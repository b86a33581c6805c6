//! Vehicle type enum and per-edge allowed-mode sets.

use std::str::FromStr;

use crate::CoreError;

// ── VehicleType ───────────────────────────────────────────────────────────────

/// The kind of traveller a vehicle represents.
///
/// The per-type constants (free-flow top speed, capacity weight,
/// acceleration) live here so every subsystem agrees on them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    #[default]
    Car,
    Bicycle,
    Pedestrian,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] =
        [VehicleType::Car, VehicleType::Bicycle, VehicleType::Pedestrian];

    /// Free-flow top speed in map units per second.
    #[inline]
    pub fn max_speed(self) -> f64 {
        match self {
            VehicleType::Car        => 60.0,
            VehicleType::Bicycle    => 40.0,
            VehicleType::Pedestrian => 20.0,
        }
    }

    /// Contribution to an edge's weighted load.
    #[inline]
    pub fn capacity_weight(self) -> f64 {
        match self {
            VehicleType::Car        => 1.0,
            VehicleType::Bicycle    => 0.5,
            VehicleType::Pedestrian => 0.2,
        }
    }

    /// Speed change per second of acceleration or braking.
    #[inline]
    pub fn acceleration(self) -> f64 {
        match self {
            VehicleType::Car        => 2.5,
            VehicleType::Bicycle    => 1.8,
            VehicleType::Pedestrian => 1.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Car        => "car",
            VehicleType::Bicycle    => "bicycle",
            VehicleType::Pedestrian => "pedestrian",
        }
    }
}

impl FromStr for VehicleType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car"        => Ok(VehicleType::Car),
            "bicycle"    => Ok(VehicleType::Bicycle),
            "pedestrian" => Ok(VehicleType::Pedestrian),
            other        => Err(CoreError::UnknownMode(other.to_owned())),
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ModeSet ───────────────────────────────────────────────────────────────────

/// A set of allowed [`VehicleType`]s on an edge, stored as a bitmask.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ModeSet(u8);

impl ModeSet {
    pub const EMPTY: ModeSet = ModeSet(0);
    pub const ALL: ModeSet = ModeSet(0b111);

    #[inline]
    fn bit(mode: VehicleType) -> u8 {
        match mode {
            VehicleType::Car        => 0b001,
            VehicleType::Bicycle    => 0b010,
            VehicleType::Pedestrian => 0b100,
        }
    }

    pub fn single(mode: VehicleType) -> ModeSet {
        ModeSet(Self::bit(mode))
    }

    #[inline]
    pub fn allows(self, mode: VehicleType) -> bool {
        self.0 & Self::bit(mode) != 0
    }

    #[inline]
    pub fn insert(&mut self, mode: VehicleType) {
        self.0 |= Self::bit(mode);
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The modes in this set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = VehicleType> {
        VehicleType::ALL.into_iter().filter(move |&m| self.allows(m))
    }
}

impl FromIterator<VehicleType> for ModeSet {
    fn from_iter<I: IntoIterator<Item = VehicleType>>(iter: I) -> Self {
        let mut set = ModeSet::EMPTY;
        for mode in iter {
            set.insert(mode);
        }
        set
    }
}
