//! Vehicle-type spawn distribution.

use tm_core::{SimRng, VehicleType};

use crate::error::{SimError, SimResult};

/// Relative weights for sampling a vehicle type at spawn time.
///
/// Weights need not sum to 1; they are normalized at sampling.  All-zero or
/// negative weights are rejected by [`SpawnMix::validated`].
#[derive(Copy, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SpawnMix {
    pub car: f64,
    pub bicycle: f64,
    pub pedestrian: f64,
}

impl Default for SpawnMix {
    /// The city-commute mix: mostly cars, some bicycles, few pedestrians.
    fn default() -> Self {
        Self { car: 0.6, bicycle: 0.25, pedestrian: 0.15 }
    }
}

impl SpawnMix {
    /// Every weight on one type.
    pub fn only(kind: VehicleType) -> Self {
        let mut mix = Self { car: 0.0, bicycle: 0.0, pedestrian: 0.0 };
        match kind {
            VehicleType::Car        => mix.car = 1.0,
            VehicleType::Bicycle    => mix.bicycle = 1.0,
            VehicleType::Pedestrian => mix.pedestrian = 1.0,
        }
        mix
    }

    /// Reject malformed distributions.
    pub fn validated(self) -> SimResult<Self> {
        let weights = [self.car, self.bicycle, self.pedestrian];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SimError::Validation(
                "spawn distribution weights must be finite and non-negative".into(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(SimError::Validation(
                "spawn distribution weights must not all be zero".into(),
            ));
        }
        Ok(self)
    }

    /// Draw one vehicle type.  One uniform sample against the cumulative
    /// weights, so call order alone determines the stream.
    pub fn sample(&self, rng: &mut SimRng) -> VehicleType {
        let total = self.car + self.bicycle + self.pedestrian;
        let draw = rng.gen_range(0.0..total);
        if draw < self.car {
            VehicleType::Car
        } else if draw < self.car + self.bicycle {
            VehicleType::Bicycle
        } else {
            VehicleType::Pedestrian
        }
    }
}
