//! Components for barrels and the geometry they trace against.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::profile::{lerp, ProfileId, ProjectileProfile};
use crate::types::{HitPrediction, LaunchState, TraceComplexity};

/// Weapon barrel: launch point of projectiles and the source of predictions.
///
/// The barrel's forward axis (`-Z` of its `GlobalTransform`) is the aim
/// direction when predicting from the component itself.
///
/// # Fields
/// * `profile` - Projectile type currently chambered
/// * `muzzle_velocity_multiplier_min` / `_max` - Barrel-specific speed multiplier range
/// * `inherit_velocity` - Fraction of the carrier body's velocity given to projectiles
/// * `additional_velocity` - Extra launch velocity (world space)
/// * `owner` - Actor that fires this barrel; excluded from safe launches.
///   Requests default it to the root of the barrel's `ChildOf` hierarchy
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::prelude::*;
///
/// let barrel = Barrel::new(ProfileId(1))
///     .with_multiplier_range(0.95, 1.05)
///     .with_owner(Entity::PLACEHOLDER);
/// assert_eq!(barrel.profile, ProfileId(1));
/// ```
#[derive(Component, Reflect, Clone, Debug, PartialEq)]
#[reflect(Component)]
pub struct Barrel {
    /// Chambered projectile type
    pub profile: ProfileId,
    /// Lower bound of the muzzle velocity multiplier
    pub muzzle_velocity_multiplier_min: f32,
    /// Upper bound of the muzzle velocity multiplier
    pub muzzle_velocity_multiplier_max: f32,
    /// Carrier velocity inheritance (0.0 - 1.0)
    pub inherit_velocity: f32,
    /// Additional launch velocity (m/s)
    pub additional_velocity: Vec3,
    /// Launching actor
    pub owner: Option<Entity>,
}

impl Default for Barrel {
    fn default() -> Self {
        Self {
            profile: ProfileId::default(),
            muzzle_velocity_multiplier_min: 1.0,
            muzzle_velocity_multiplier_max: 1.0,
            inherit_velocity: 1.0,
            additional_velocity: Vec3::ZERO,
            owner: None,
        }
    }
}

impl Barrel {
    pub fn new(profile: ProfileId) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    pub fn with_multiplier_range(mut self, min: f32, max: f32) -> Self {
        self.muzzle_velocity_multiplier_min = min;
        self.muzzle_velocity_multiplier_max = max;
        self
    }

    pub fn with_inherit_velocity(mut self, fraction: f32) -> Self {
        self.inherit_velocity = fraction;
        self
    }

    pub fn with_additional_velocity(mut self, velocity: Vec3) -> Self {
        self.additional_velocity = velocity;
        self
    }

    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Launch state from the muzzle transform: its translation and forward axis.
    pub fn launch_state<'a>(&self, muzzle: &GlobalTransform) -> LaunchState<'a> {
        self.launch_state_from(muzzle.translation(), muzzle.forward().as_vec3())
    }

    /// Launch state from an explicit location and aim direction.
    pub fn launch_state_from<'a>(&self, location: Vec3, direction: Vec3) -> LaunchState<'a> {
        LaunchState {
            location,
            direction,
            additional_velocity: self.additional_velocity,
            inherit_velocity: self.inherit_velocity,
            muzzle_velocity_multiplier_min: self.muzzle_velocity_multiplier_min,
            muzzle_velocity_multiplier_max: self.muzzle_velocity_multiplier_max,
            owner: self.owner,
            carrier: None,
        }
    }

    /// Muzzle speed of an actual fired shot.
    ///
    /// Samples both ranges uniformly from a seeded RNG, so fired shots
    /// scatter around the speed predictions assume. Same seed, same speed.
    pub fn sample_muzzle_speed(&self, profile: &ProjectileProfile, seed: u64) -> f32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let velocity = lerp(
            profile.muzzle_velocity_min,
            profile.muzzle_velocity_max,
            rng.random::<f32>(),
        );
        let multiplier = lerp(
            self.muzzle_velocity_multiplier_min,
            self.muzzle_velocity_multiplier_max,
            rng.random::<f32>(),
        );
        velocity * multiplier
    }
}

/// Restricts a collider to one trace complexity.
///
/// Lets an actor carry a cheap proxy for simple traces next to exact
/// geometry for complex ones. Colliders without this component answer both.
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Eq)]
#[reflect(Component)]
pub enum CollisionProxy {
    /// Only simple traces hit this collider
    Simple,
    /// Only complex traces hit this collider
    Complex,
}

impl CollisionProxy {
    pub fn accepts(self, complexity: TraceComplexity) -> bool {
        matches!(
            (self, complexity),
            (Self::Simple, TraceComplexity::Simple) | (Self::Complex, TraceComplexity::Complex)
        )
    }
}

/// Physical material identity reported on hits (concrete, flesh, metal...).
#[derive(Component, Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub struct PhysicalSurface(pub u32);

/// Most recent prediction served for a barrel, kept for debug drawing.
#[derive(Component, Clone, Debug, Default)]
pub struct PredictedTrajectory {
    /// Sampled flight path
    pub points: Vec<Vec3>,
    /// Hit point, if the prediction struck something
    pub hit: Option<Vec3>,
}

impl From<&HitPrediction> for PredictedTrajectory {
    fn from(prediction: &HitPrediction) -> Self {
        Self {
            points: prediction.trajectory.clone(),
            hit: prediction
                .outcome
                .hit
                .then_some(prediction.outcome.location),
        }
    }
}
