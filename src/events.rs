//! Request and response messages for barrel prediction.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::ecs::message::Message;
use bevy::prelude::*;

use crate::types::{HitPrediction, InterceptSolution};

/// Where a requested shot starts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LaunchOrigin {
    /// The barrel's `GlobalTransform`: its translation and forward (`-Z`) axis
    #[default]
    Muzzle,
    /// Explicit start location and aim direction
    Location { location: Vec3, direction: Vec3 },
}

/// Asks for a hit prediction from a barrel.
///
/// Answered with a [`HitPredicted`] in the same fixed step.
///
/// # Fields
/// * `barrel` - Entity carrying the [`Barrel`](crate::components::Barrel) component
/// * `origin` - Muzzle or explicit launch point
/// * `ignored` - Extra actors the shot passes through
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::events::PredictHitRequest;
///
/// let request = PredictHitRequest::new(Entity::PLACEHOLDER)
///     .from_location(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z)
///     .ignoring([Entity::PLACEHOLDER]);
/// assert_eq!(request.ignored.len(), 1);
/// ```
#[derive(Message, Clone, Debug)]
pub struct PredictHitRequest {
    /// Barrel entity
    pub barrel: Entity,
    /// Launch point
    pub origin: LaunchOrigin,
    /// Actors to ignore in addition to the launcher
    pub ignored: Vec<Entity>,
}

impl PredictHitRequest {
    pub fn new(barrel: Entity) -> Self {
        Self {
            barrel,
            origin: LaunchOrigin::Muzzle,
            ignored: Vec::new(),
        }
    }

    pub fn from_location(mut self, location: Vec3, direction: Vec3) -> Self {
        self.origin = LaunchOrigin::Location {
            location,
            direction,
        };
        self
    }

    pub fn ignoring(mut self, actors: impl IntoIterator<Item = Entity>) -> Self {
        self.ignored.extend(actors);
        self
    }
}

/// Answer to a [`PredictHitRequest`].
///
/// `prediction` is empty when the barrel or its projectile profile could
/// not be resolved.
#[derive(Message, Clone, Debug)]
pub struct HitPredicted {
    /// Barrel the prediction was made for
    pub barrel: Entity,
    /// Hit outcome and sampled path
    pub prediction: HitPrediction,
}

/// Asks for an aim solution against a moving target.
///
/// # Fields
/// * `barrel` - Entity carrying the [`Barrel`](crate::components::Barrel) component
/// * `origin` - Explicit start location, or `None` for the muzzle
/// * `target_location` - Current target position
/// * `target_velocity` - Target velocity, assumed constant
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::events::AimRequest;
///
/// let request = AimRequest::new(Entity::PLACEHOLDER, Vec3::new(0.0, 0.0, -150.0))
///     .with_target_velocity(Vec3::X * 12.0);
/// assert!(request.origin.is_none());
/// ```
#[derive(Message, Clone, Debug)]
pub struct AimRequest {
    /// Barrel entity
    pub barrel: Entity,
    /// Launch point override
    pub origin: Option<Vec3>,
    /// Target position now
    pub target_location: Vec3,
    /// Target velocity (m/s)
    pub target_velocity: Vec3,
}

impl AimRequest {
    pub fn new(barrel: Entity, target_location: Vec3) -> Self {
        Self {
            barrel,
            origin: None,
            target_location,
            target_velocity: Vec3::ZERO,
        }
    }

    pub fn with_target_velocity(mut self, velocity: Vec3) -> Self {
        self.target_velocity = velocity;
        self
    }

    pub fn from_location(mut self, location: Vec3) -> Self {
        self.origin = Some(location);
        self
    }
}

/// Answer to an [`AimRequest`].
///
/// An unresolvable barrel or profile yields an infinite `error`.
#[derive(Message, Clone, Debug)]
pub struct AimSolved {
    /// Barrel the solution was computed for
    pub barrel: Entity,
    /// Aim direction, intercept point and residual error
    pub solution: InterceptSolution,
}
