//! Common types shared by the integrator, the collision probe and the
//! intercept solver.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::PhysicalSurface;
use crate::resources::BallisticsEnvironment;

/// Integration method used inside a single velocity update.
///
/// # Variants
/// * `Euler` - Simple Euler integration (faster but less accurate)
/// * `RK4` - Runge-Kutta 4th order integration (more accurate, slightly slower)
///
/// # Example
/// ```
/// use bevy_barrel_prediction::types::PhysicsModel;
///
/// let model = PhysicsModel::RK4; // For high accuracy
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect)]
pub enum PhysicsModel {
    /// Simple Euler integration (fast, less accurate)
    Euler,
    /// Runge-Kutta 4th order (accurate, slightly slower)
    #[default]
    RK4,
}

/// Collision channel a projectile traces against.
///
/// Stored as a bitmask so it maps directly onto physics collision layers.
/// A query only considers geometry whose layers intersect the channel.
///
/// # Example
/// ```
/// use bevy_barrel_prediction::types::TraceChannel;
///
/// let terrain = TraceChannel::from_layer(0);
/// let vehicles = TraceChannel::from_layer(3);
/// let both = terrain.union(vehicles);
/// assert!(both.contains(vehicles));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct TraceChannel(pub u32);

impl TraceChannel {
    /// Every collision layer.
    pub const ALL: Self = Self(u32::MAX);
    /// No collision layer; traces on this channel never hit.
    pub const NONE: Self = Self(0);

    /// Channel containing the single layer `index`.
    ///
    /// # Panics
    /// If `index` is not below 32.
    pub const fn from_layer(index: u32) -> Self {
        assert!(index < 32, "collision layer index out of range");
        Self(1 << index)
    }

    /// Combined channel.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every layer of `other` is part of this channel.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the two channels share at least one layer.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for TraceChannel {
    fn default() -> Self {
        Self::ALL
    }
}

/// Which collision representation a trace is tested against.
///
/// # Variants
/// * `Simple` - Simplified collision proxies (boxes, capsules, hulls)
/// * `Complex` - Exact per-polygon render geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Reflect)]
pub enum TraceComplexity {
    #[default]
    Simple,
    Complex,
}

/// Parameters of one line trace.
#[derive(Clone, Copy, Debug)]
pub struct TraceParams<'a> {
    /// Channel the trace is filtered by
    pub channel: TraceChannel,
    /// Collision representation to test against
    pub complexity: TraceComplexity,
    /// Whether the hit should carry the struck physical material
    pub return_physical_material: bool,
    /// Actors the trace passes through
    pub ignored: &'a [Entity],
}

impl<'a> TraceParams<'a> {
    /// Trace on every channel against simple collision, ignoring nothing.
    pub fn new(ignored: &'a [Entity]) -> Self {
        Self {
            channel: TraceChannel::ALL,
            complexity: TraceComplexity::Simple,
            return_physical_material: false,
            ignored,
        }
    }

    /// Whether `actor` must be skipped by this trace.
    pub fn ignores(&self, actor: Entity) -> bool {
        self.ignored.contains(&actor)
    }
}

/// Blocking hit returned by a line trace.
///
/// # Fields
/// * `location` - World-space point where the segment met geometry
/// * `normal` - Surface normal at the hit
/// * `time` - Fraction along the traced segment, in `0.0..=1.0`
/// * `distance` - Distance from the segment start to `location`
/// * `actor` - Entity that was struck, if the geometry belongs to one
/// * `physical_material` - Surface identity, when requested and known
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitResult {
    pub location: Vec3,
    pub normal: Vec3,
    pub time: f32,
    pub distance: f32,
    pub actor: Option<Entity>,
    pub physical_material: Option<PhysicalSurface>,
}

/// World collision query service.
///
/// The only point where prediction touches world state. Implementations
/// must be read-only: repeated identical queries against unchanged geometry
/// return identical results.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::types::{HitResult, LineTrace, TraceParams};
///
/// /// Infinite ground plane at y = 0.
/// struct Ground;
///
/// impl LineTrace for Ground {
///     fn line_trace(&self, start: Vec3, end: Vec3, _params: &TraceParams<'_>) -> Option<HitResult> {
///         if start.y < 0.0 || end.y >= 0.0 {
///             return None;
///         }
///         let time = start.y / (start.y - end.y);
///         let location = start.lerp(end, time);
///         Some(HitResult {
///             location,
///             normal: Vec3::Y,
///             time,
///             distance: start.distance(location),
///             actor: None,
///             physical_material: None,
///         })
///     }
/// }
/// ```
pub trait LineTrace {
    /// Nearest blocking hit strictly between `start` and `end`, or `None`.
    fn line_trace(&self, start: Vec3, end: Vec3, params: &TraceParams<'_>) -> Option<HitResult>;
}

impl<T: LineTrace + ?Sized> LineTrace for &T {
    fn line_trace(&self, start: Vec3, end: Vec3, params: &TraceParams<'_>) -> Option<HitResult> {
        (**self).line_trace(start, end, params)
    }
}

/// A world with no collidable geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenSky;

impl LineTrace for OpenSky {
    fn line_trace(&self, _start: Vec3, _end: Vec3, _params: &TraceParams<'_>) -> Option<HitResult> {
        None
    }
}

/// Physics body a barrel may be attached to (vehicle hull, turret ring).
pub trait CarrierBody {
    /// Whether the body is driven by the physics simulation.
    fn is_simulating_physics(&self) -> bool;

    /// Velocity of the body's material point at `point`, world space.
    fn linear_velocity_at_point(&self, point: Vec3) -> Vec3;
}

/// Read-only world context a prediction runs in.
///
/// Bundles the collision query service with the environment the
/// projectile's velocity rule reads.
pub struct ShotWorld<'a, W: ?Sized> {
    /// Collision query service
    pub trace: &'a W,
    /// Gravity, air and wind
    pub environment: &'a BallisticsEnvironment,
}

impl<'a, W: ?Sized> ShotWorld<'a, W> {
    pub fn new(trace: &'a W, environment: &'a BallisticsEnvironment) -> Self {
        Self { trace, environment }
    }
}

impl<W: ?Sized> Clone for ShotWorld<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: ?Sized> Copy for ShotWorld<'_, W> {}

/// Initial conditions of a simulated shot.
///
/// # Fields
/// * `location` - World-space launch point
/// * `direction` - Aim direction; normalized on use, a zero vector contributes no muzzle velocity
/// * `additional_velocity` - Externally supplied velocity (moving platform)
/// * `inherit_velocity` - Fraction of the carrier body's velocity passed on to the projectile
/// * `muzzle_velocity_multiplier_min` / `_max` - Barrel multiplier range; predictions use its midpoint
/// * `owner` - Launching actor, excluded from collision when the profile asks for a safe launch
/// * `carrier` - Physics body the barrel rides on
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::types::LaunchState;
///
/// let launch = LaunchState::new(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z)
///     .with_additional_velocity(Vec3::X * 5.0)
///     .with_inherit_velocity(0.5);
/// assert_eq!(launch.inherit_velocity, 0.5);
/// ```
#[derive(Clone, Copy)]
pub struct LaunchState<'a> {
    pub location: Vec3,
    pub direction: Vec3,
    pub additional_velocity: Vec3,
    pub inherit_velocity: f32,
    pub muzzle_velocity_multiplier_min: f32,
    pub muzzle_velocity_multiplier_max: f32,
    pub owner: Option<Entity>,
    pub carrier: Option<&'a dyn CarrierBody>,
}

impl Default for LaunchState<'_> {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            additional_velocity: Vec3::ZERO,
            inherit_velocity: 1.0,
            muzzle_velocity_multiplier_min: 1.0,
            muzzle_velocity_multiplier_max: 1.0,
            owner: None,
            carrier: None,
        }
    }
}

impl<'a> LaunchState<'a> {
    /// Launch from `location` along `direction` with neutral barrel settings.
    pub fn new(location: Vec3, direction: Vec3) -> Self {
        Self {
            location,
            direction,
            ..Default::default()
        }
    }

    pub fn with_additional_velocity(mut self, velocity: Vec3) -> Self {
        self.additional_velocity = velocity;
        self
    }

    pub fn with_inherit_velocity(mut self, fraction: f32) -> Self {
        self.inherit_velocity = fraction;
        self
    }

    pub fn with_multiplier_range(mut self, min: f32, max: f32) -> Self {
        self.muzzle_velocity_multiplier_min = min;
        self.muzzle_velocity_multiplier_max = max;
        self
    }

    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_carrier(mut self, carrier: Option<&'a dyn CarrierBody>) -> Self {
        self.carrier = carrier;
        self
    }

    /// Same launch aimed along another direction.
    pub fn aimed(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }
}

/// Result of a hit prediction.
///
/// When nothing was struck `hit` is false, `time` is the simulated time
/// budget and `location` the final unobstructed position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitOutcome {
    /// Whether the projectile struck something
    pub hit: bool,
    /// Hit point, or final position without a hit
    pub location: Vec3,
    /// Simulated time of the hit (interpolated inside the step)
    pub time: f32,
    /// Struck actor
    pub actor: Option<Entity>,
    /// Raw probe result
    pub trace: Option<HitResult>,
}

/// Hit outcome plus the sampled flight path.
///
/// `trajectory` holds the position at the start of each simulated step,
/// followed by the hit point or the final position. It is empty only
/// when the prediction was rejected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitPrediction {
    pub outcome: HitOutcome,
    pub trajectory: Vec<Vec3>,
}

impl HitPrediction {
    /// Whether the prediction was rejected before simulating.
    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }
}

/// How the intercept solver corrects its aim point between iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum AimCorrection {
    /// Aim at the extrapolated target position only
    #[default]
    Lead,
    /// Also shift the aim point by the miss measured at the target plane,
    /// compensating drop and drift
    LeadAndDrop,
}

/// Tuning of one intercept solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterceptSettings {
    /// Simulated time budget per projection (seconds)
    pub max_time: f32,
    /// Integration step (seconds)
    pub step: f32,
    /// Refinement iterations before the final projection
    pub iterations: u32,
    /// Aim correction strategy
    pub correction: AimCorrection,
}

impl Default for InterceptSettings {
    fn default() -> Self {
        Self {
            max_time: 10.0,
            step: 0.1,
            iterations: 4,
            correction: AimCorrection::Lead,
        }
    }
}

/// Aim solution for a moving target.
///
/// # Fields
/// * `aim_direction` - Unit direction to fire along
/// * `predicted_target_location` - Where the target will be at intercept
/// * `predicted_intersection_location` - Where the shot crosses the target plane
/// * `predicted_flight_time` - Flight time of the final projection
/// * `error` - Distance between the two predicted locations; zero when converged
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InterceptSolution {
    pub aim_direction: Vec3,
    pub predicted_target_location: Vec3,
    pub predicted_intersection_location: Vec3,
    pub predicted_flight_time: f32,
    pub error: f32,
}

impl InterceptSolution {
    /// Whether the residual error is within `tolerance` distance units.
    pub fn converged(&self, tolerance: f32) -> bool {
        self.error <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_channel_layers() {
        let terrain = TraceChannel::from_layer(0);
        let water = TraceChannel::from_layer(1);

        assert!(!terrain.intersects(water));
        assert!(terrain.union(water).contains(water));
        assert!(TraceChannel::ALL.contains(terrain));
        assert!(!TraceChannel::NONE.intersects(terrain));
    }

    #[test]
    #[should_panic(expected = "collision layer index out of range")]
    fn test_trace_channel_rejects_layer_32() {
        let _ = TraceChannel::from_layer(std::hint::black_box(32));
    }

    #[test]
    fn test_open_sky_never_hits() {
        let params = TraceParams::new(&[]);
        assert!(OpenSky.line_trace(Vec3::ZERO, Vec3::X * 1000.0, &params).is_none());
    }

    #[test]
    fn test_launch_state_defaults_are_neutral() {
        let launch = LaunchState::new(Vec3::ONE, Vec3::X);
        assert_eq!(launch.additional_velocity, Vec3::ZERO);
        assert_eq!(launch.muzzle_velocity_multiplier_min, 1.0);
        assert_eq!(launch.muzzle_velocity_multiplier_max, 1.0);
        assert!(launch.owner.is_none());
        assert!(launch.carrier.is_none());
    }
}
