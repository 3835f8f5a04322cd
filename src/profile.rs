//! Projectile profiles: the per-type data a prediction consumes.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::BallisticsEnvironment;
use crate::systems::kinematics::DragModel;
use crate::types::{TraceChannel, TraceComplexity};

/// Per-projectile-type velocity update.
///
/// Encapsulates everything that bends the flight path (gravity, drag,
/// wind, guidance). Called once per simulated step with the velocity at the
/// start of the step; returns the velocity at its end.
///
/// Any `Fn(&BallisticsEnvironment, Vec3, Vec3, f32) -> Vec3` closure is a
/// velocity rule.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::prelude::*;
///
/// // Rocket: constant thrust along the flight direction plus gravity
/// let rocket = |env: &BallisticsEnvironment, _position: Vec3, velocity: Vec3, step: f32| {
///     velocity + (velocity.normalize_or_zero() * 30.0 + env.gravity) * step
/// };
/// let profile = ProjectileProfile::new(60.0, 60.0, rocket);
/// assert!(profile.validate().is_ok());
/// ```
pub trait VelocityUpdate: Send + Sync + 'static {
    fn update_velocity(
        &self,
        environment: &BallisticsEnvironment,
        position: Vec3,
        velocity: Vec3,
        step: f32,
    ) -> Vec3;
}

impl<F> VelocityUpdate for F
where
    F: Fn(&BallisticsEnvironment, Vec3, Vec3, f32) -> Vec3 + Send + Sync + 'static,
{
    fn update_velocity(
        &self,
        environment: &BallisticsEnvironment,
        position: Vec3,
        velocity: Vec3,
        step: f32,
    ) -> Vec3 {
        self(environment, position, velocity, step)
    }
}

/// No forces at all: the projectile keeps its launch velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inert;

impl VelocityUpdate for Inert {
    fn update_velocity(&self, _: &BallisticsEnvironment, _: Vec3, velocity: Vec3, _: f32) -> Vec3 {
        velocity
    }
}

/// Identifier under which a profile is registered in
/// [`ProjectileProfiles`](crate::resources::ProjectileProfiles).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize,
)]
pub struct ProfileId(pub u32);

/// Why a projectile profile cannot be used for prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("muzzle velocity range [{min}, {max}] is not finite")]
    NonFiniteMuzzleVelocity { min: f32, max: f32 },
    #[error("no projectile profile registered for {0:?}")]
    Unknown(ProfileId),
}

/// Description of a projectile type.
///
/// # Fields
/// * `muzzle_velocity_min` / `muzzle_velocity_max` - Launch speed range (m/s).
///   Prediction uses the midpoint; a reversed range is accepted as-is.
/// * `trace_channel` - Collision channel the projectile traces against
/// * `trace_complexity` - Simple proxies or exact geometry
/// * `safe_launch` - Exclude the launching actor from collision
/// * `velocity_rule` - Gravity/drag/guidance update, see [`VelocityUpdate`]
///
/// # Example
/// ```
/// use bevy_barrel_prediction::prelude::*;
///
/// let rifle = ProjectileProfile::new(880.0, 920.0, DragModel::default())
///     .with_trace_complexity(TraceComplexity::Complex);
/// assert_eq!(rifle.muzzle_velocity(), 900.0);
/// ```
#[derive(Clone)]
pub struct ProjectileProfile {
    pub muzzle_velocity_min: f32,
    pub muzzle_velocity_max: f32,
    pub trace_channel: TraceChannel,
    pub trace_complexity: TraceComplexity,
    pub safe_launch: bool,
    pub velocity_rule: Arc<dyn VelocityUpdate>,
}

impl Default for ProjectileProfile {
    /// 400 m/s rifle-like bullet with default drag, safe launch enabled.
    fn default() -> Self {
        Self {
            muzzle_velocity_min: 400.0,
            muzzle_velocity_max: 400.0,
            trace_channel: TraceChannel::ALL,
            trace_complexity: TraceComplexity::Simple,
            safe_launch: true,
            velocity_rule: Arc::new(DragModel::default()),
        }
    }
}

impl fmt::Debug for ProjectileProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectileProfile")
            .field("muzzle_velocity_min", &self.muzzle_velocity_min)
            .field("muzzle_velocity_max", &self.muzzle_velocity_max)
            .field("trace_channel", &self.trace_channel)
            .field("trace_complexity", &self.trace_complexity)
            .field("safe_launch", &self.safe_launch)
            .finish_non_exhaustive()
    }
}

impl ProjectileProfile {
    pub fn new(min: f32, max: f32, velocity_rule: impl VelocityUpdate) -> Self {
        Self {
            muzzle_velocity_min: min,
            muzzle_velocity_max: max,
            velocity_rule: Arc::new(velocity_rule),
            ..Default::default()
        }
    }

    pub fn with_trace_channel(mut self, channel: TraceChannel) -> Self {
        self.trace_channel = channel;
        self
    }

    pub fn with_trace_complexity(mut self, complexity: TraceComplexity) -> Self {
        self.trace_complexity = complexity;
        self
    }

    pub fn with_safe_launch(mut self, safe_launch: bool) -> Self {
        self.safe_launch = safe_launch;
        self
    }

    pub fn with_velocity_rule(mut self, velocity_rule: impl VelocityUpdate) -> Self {
        self.velocity_rule = Arc::new(velocity_rule);
        self
    }

    /// Deterministic muzzle speed used for prediction: midpoint of the range.
    pub fn muzzle_velocity(&self) -> f32 {
        midpoint(self.muzzle_velocity_min, self.muzzle_velocity_max)
    }

    /// Checks the profile can drive a simulation.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.muzzle_velocity_min.is_finite() || !self.muzzle_velocity_max.is_finite() {
            return Err(ProfileError::NonFiniteMuzzleVelocity {
                min: self.muzzle_velocity_min,
                max: self.muzzle_velocity_max,
            });
        }
        Ok(())
    }

    /// Velocity at the end of a step starting at `position` with `velocity`.
    pub fn update_velocity(
        &self,
        environment: &BallisticsEnvironment,
        position: Vec3,
        velocity: Vec3,
        step: f32,
    ) -> Vec3 {
        self.velocity_rule
            .update_velocity(environment, position, velocity, step)
    }
}

/// Linear interpolation between the ends of a range; reversed ranges are fine.
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub(crate) fn midpoint(a: f32, b: f32) -> f32 {
    lerp(a, b, 0.5)
}
