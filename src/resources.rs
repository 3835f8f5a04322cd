//! Global resources for barrel prediction.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileError, ProfileId, ProjectileProfile};
use crate::types::{AimCorrection, InterceptSettings};

/// Global environment read by projectile velocity rules.
///
/// # Fields
/// * `gravity` - Gravity vector in meters per second squared
/// * `air_density` - Sea-level air density in kg/m³
/// * `wind` - Wind velocity vector in meters per second
/// * `temperature` - Ambient temperature in Celsius
/// * `altitude` - Altitude of the world origin in meters
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::resources::BallisticsEnvironment;
///
/// let env = BallisticsEnvironment {
///     gravity: Vec3::new(0.0, -9.81, 0.0),
///     air_density: 1.1,
///     wind: Vec3::new(2.0, 0.0, 0.0),
///     temperature: 25.0,
///     altitude: 100.0,
/// };
/// ```
#[derive(Resource, Reflect, Clone, Debug, PartialEq)]
#[reflect(Resource)]
pub struct BallisticsEnvironment {
    /// Gravity vector (m/s²)
    pub gravity: Vec3,
    /// Air density affecting drag (kg/m³)
    pub air_density: f32,
    /// Wind velocity vector (m/s)
    pub wind: Vec3,
    /// Temperature affecting air density calculations (Celsius)
    pub temperature: f32,
    /// Altitude of the world origin (meters)
    pub altitude: f32,
}

impl Default for BallisticsEnvironment {
    /// Earth-like conditions: 9.81 m/s² downward, 1.225 kg/m³ sea-level air,
    /// no wind, 20°C at sea level.
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            air_density: 1.225, // Standard at sea level
            wind: Vec3::ZERO,
            temperature: 20.0,
            altitude: 0.0,
        }
    }
}

impl BallisticsEnvironment {
    /// No gravity, no air, no wind.
    pub fn vacuum() -> Self {
        Self {
            gravity: Vec3::ZERO,
            air_density: 0.0,
            ..Default::default()
        }
    }

    /// Air density at the world origin, adjusted for altitude and temperature.
    pub fn effective_air_density(&self) -> f32 {
        self.air_density_at(0.0)
    }

    /// Air density `height` meters above the world origin.
    ///
    /// Simplified barometric formula with an 8.5 km scale height.
    pub fn air_density_at(&self, height: f32) -> f32 {
        let temp_kelvin = self.temperature + 273.15;
        let pressure_ratio = (-(self.altitude + height) / 8500.0).exp();
        self.air_density * pressure_ratio * (288.15 / temp_kelvin)
    }
}

/// Prediction defaults used when serving requests.
///
/// Loadable from any serde format; missing fields fall back to defaults.
///
/// # Example
/// ```
/// use bevy_barrel_prediction::resources::PredictionConfig;
///
/// let config = PredictionConfig {
///     max_time: 4.0,
///     step: 1.0 / 60.0,
///     ..Default::default()
/// };
/// assert_eq!(config.intercept_settings().max_time, 4.0);
/// ```
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct PredictionConfig {
    /// Simulated time budget (seconds)
    pub max_time: f32,
    /// Integration step (seconds)
    pub step: f32,
    /// Intercept refinement iterations
    pub iterations: u32,
    /// Intercept aim correction
    pub aim_correction: AimCorrection,
    /// Draw predicted trajectories with gizmos
    pub debug_draw: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            max_time: 10.0,
            step: 0.1,
            iterations: 4,
            aim_correction: AimCorrection::Lead,
            debug_draw: false,
        }
    }
}

impl PredictionConfig {
    pub fn intercept_settings(&self) -> InterceptSettings {
        InterceptSettings {
            max_time: self.max_time,
            step: self.step,
            iterations: self.iterations,
            correction: self.aim_correction,
        }
    }
}

/// Registry of projectile types barrels can reference by [`ProfileId`].
#[derive(Resource, Default, Debug)]
pub struct ProjectileProfiles {
    profiles: HashMap<ProfileId, ProjectileProfile>,
}

impl ProjectileProfiles {
    /// Registers `profile`, returning the one it replaced.
    pub fn insert(&mut self, id: ProfileId, profile: ProjectileProfile) -> Option<ProjectileProfile> {
        self.profiles.insert(id, profile)
    }

    pub fn remove(&mut self, id: ProfileId) -> Option<ProjectileProfile> {
        self.profiles.remove(&id)
    }

    pub fn get(&self, id: ProfileId) -> Result<&ProjectileProfile, ProfileError> {
        self.profiles.get(&id).ok_or(ProfileError::Unknown(id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
