//! Velocity rules - gravity and aerodynamic drag with RK4 or Euler sub-steps.

use bevy::prelude::*;

use crate::profile::VelocityUpdate;
use crate::resources::BallisticsEnvironment;
use crate::types::PhysicsModel;

/// Point-mass projectile under gravity and quadratic air drag.
///
/// Drag acts on the velocity relative to the wind, with air density taken
/// at the projectile's height.
///
/// # Fields
/// * `mass` - Mass of the projectile in kilograms
/// * `drag_coefficient` - Dimensionless drag coefficient (typically 0.2-0.5 for bullets)
/// * `reference_area` - Cross-sectional reference area in square meters
/// * `integration` - Integration method for one velocity update
///
/// # Example
/// ```
/// use bevy_barrel_prediction::prelude::*;
///
/// let arrow = DragModel::new(0.03, 0.5, 0.0002).with_integration(PhysicsModel::Euler);
/// let profile = ProjectileProfile::new(80.0, 80.0, arrow);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct DragModel {
    /// Mass of the projectile (kg)
    pub mass: f32,
    /// Drag coefficient (Cd)
    pub drag_coefficient: f32,
    /// Cross-sectional reference area (m²)
    pub reference_area: f32,
    /// Integration method
    pub integration: PhysicsModel,
}

impl Default for DragModel {
    /// 10g bullet, 0.3 drag coefficient, ~1cm² cross-section, RK4.
    fn default() -> Self {
        Self {
            mass: 0.01,
            drag_coefficient: 0.3,
            reference_area: 0.0001,
            integration: PhysicsModel::RK4,
        }
    }
}

impl DragModel {
    pub fn new(mass: f32, drag_coefficient: f32, reference_area: f32) -> Self {
        Self {
            mass,
            drag_coefficient,
            reference_area,
            ..Default::default()
        }
    }

    /// Gravity only.
    pub fn vacuum() -> Self {
        Self {
            drag_coefficient: 0.0,
            ..Default::default()
        }
    }

    pub fn with_integration(mut self, integration: PhysicsModel) -> Self {
        self.integration = integration;
        self
    }

    /// Acceleration from gravity and aerodynamic drag.
    ///
    /// Uses the drag equation: F_drag = 0.5 * ρ * v² * Cd * A
    pub fn acceleration(&self, env: &BallisticsEnvironment, air_density: f32, vel: Vec3) -> Vec3 {
        // Velocity relative to air (accounting for wind)
        let relative_vel = vel - env.wind;
        let speed = relative_vel.length();

        // Massless or stationary projectiles only feel gravity
        if speed < 0.001 || self.mass <= 0.0 {
            return env.gravity;
        }

        let direction = relative_vel / speed;
        let drag_magnitude =
            0.5 * air_density * speed.powi(2) * self.drag_coefficient * self.reference_area;

        env.gravity - direction * (drag_magnitude / self.mass)
    }
}

impl VelocityUpdate for DragModel {
    fn update_velocity(
        &self,
        env: &BallisticsEnvironment,
        position: Vec3,
        velocity: Vec3,
        step: f32,
    ) -> Vec3 {
        let air_density = env.air_density_at(position.y);

        match self.integration {
            PhysicsModel::RK4 => {
                let k1 = self.acceleration(env, air_density, velocity);
                let k2 = self.acceleration(env, air_density, velocity + k1 * (step / 2.0));
                let k3 = self.acceleration(env, air_density, velocity + k2 * (step / 2.0));
                let k4 = self.acceleration(env, air_density, velocity + k3 * step);

                velocity + (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0 * step
            }
            PhysicsModel::Euler => velocity + self.acceleration(env, air_density, velocity) * step,
        }
    }
}
