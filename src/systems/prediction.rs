//! Hit prediction - steps a projectile through time and reports its first
//! collision.
//!
//! Each step applies the profile's velocity rule, moves the projectile by the
//! average of the pre- and post-update velocities (trapezoidal integration)
//! and probes the swept segment for blocking geometry.

use bevy::prelude::*;

use crate::components::Barrel;
use crate::profile::{midpoint, ProjectileProfile};
use crate::systems::probe::CollisionProbe;
use crate::types::{CarrierBody, HitOutcome, HitPrediction, LaunchState, LineTrace, ShotWorld};

/// Smallest integration step (seconds); smaller or NaN steps are raised to it.
pub const MIN_STEP: f32 = 1e-4;

/// Maximum number of steps one prediction may simulate.
pub const MAX_STEPS: usize = 100_000;

/// Remaining time below this fraction of a step counts as "at max time".
const END_TOLERANCE: f32 = 1e-4;

/// Initial projectile velocity for `launch`.
///
/// Muzzle speed is the midpoint of the profile's velocity range times the
/// midpoint of the barrel's multiplier range, along the normalized aim
/// direction. A zero or non-finite direction contributes no muzzle velocity.
/// Additional velocity and the inherited share of a simulating carrier's
/// point velocity are added on top.
pub fn launch_velocity(profile: &ProjectileProfile, launch: &LaunchState<'_>) -> Vec3 {
    let speed = profile.muzzle_velocity()
        * midpoint(
            launch.muzzle_velocity_multiplier_min,
            launch.muzzle_velocity_multiplier_max,
        );

    let mut velocity = launch.direction.normalize_or_zero() * speed;
    velocity += launch.additional_velocity;

    if let Some(carrier) = launch.carrier.filter(|body| body.is_simulating_physics()) {
        velocity += carrier.linear_velocity_at_point(launch.location) * launch.inherit_velocity;
    }

    velocity
}

/// Simulates a shot and returns its first collision and sampled path.
///
/// The launcher (`launch.owner`) is ignored when the profile asks for a safe
/// launch, then `ignored` is merged in. `step` is floored at [`MIN_STEP`] and
/// the last step is shortened so simulated time never exceeds `max_time`.
///
/// An invalid profile logs a warning and yields an empty prediction.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::prelude::*;
///
/// let environment = BallisticsEnvironment::default();
/// let profile = ProjectileProfile::default();
/// let launch = LaunchState::new(Vec3::ZERO, Vec3::NEG_Z);
///
/// let prediction = predict_trajectory(
///     ShotWorld::new(&OpenSky, &environment),
///     &profile,
///     &launch,
///     &[],
///     2.0,
///     0.05,
/// );
/// assert!(!prediction.outcome.hit);
/// assert_eq!(prediction.outcome.time, 2.0);
/// ```
pub fn predict_trajectory<W: LineTrace + ?Sized>(
    world: ShotWorld<'_, W>,
    profile: &ProjectileProfile,
    launch: &LaunchState<'_>,
    ignored: &[Entity],
    max_time: f32,
    step: f32,
) -> HitPrediction {
    if let Err(err) = profile.validate() {
        warn!("Hit prediction skipped: {err}");
        return HitPrediction::default();
    }

    let max_time = max_time.max(0.0);
    let step = step.max(MIN_STEP);
    let probe = CollisionProbe::new(world.trace, profile, launch.owner, ignored);

    let mut position = launch.location;
    let mut velocity = launch_velocity(profile, launch);
    let capacity = ((max_time / step).ceil() as usize).min(MAX_STEPS) + 1;
    let mut trajectory = Vec::with_capacity(capacity);

    let mut elapsed = 0.0;
    let mut steps = 0;
    let mut capped = false;

    while max_time - elapsed > step * END_TOLERANCE {
        if steps >= MAX_STEPS {
            warn!(
                "Hit prediction stopped after {MAX_STEPS} steps at {elapsed:.3}s of {max_time:.3}s (step {step}s)"
            );
            capped = true;
            break;
        }

        let dt = step.min(max_time - elapsed);
        let previous_velocity = velocity;
        velocity = profile.update_velocity(world.environment, position, previous_velocity, dt);
        let delta = previous_velocity.lerp(velocity, 0.5) * dt;

        if let Some(hit) = probe.trace(position, position + delta) {
            trajectory.push(hit.location);
            return HitPrediction {
                outcome: HitOutcome {
                    hit: true,
                    location: hit.location,
                    time: (elapsed + hit.time * dt).min(max_time),
                    actor: hit.actor,
                    trace: Some(hit),
                },
                trajectory,
            };
        }

        trajectory.push(position);
        position += delta;
        steps += 1;
        elapsed = (steps as f32 * step).min(max_time);
    }

    trajectory.push(position);
    HitPrediction {
        outcome: HitOutcome {
            hit: false,
            location: position,
            time: if capped { elapsed } else { max_time },
            actor: None,
            trace: None,
        },
        trajectory,
    }
}

impl Barrel {
    /// Predicts a shot fired from the muzzle transform along its forward axis.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_hit<W: LineTrace + ?Sized>(
        &self,
        world: ShotWorld<'_, W>,
        profile: &ProjectileProfile,
        muzzle: &GlobalTransform,
        carrier: Option<&dyn CarrierBody>,
        ignored: &[Entity],
        max_time: f32,
        step: f32,
    ) -> HitPrediction {
        let launch = self.launch_state(muzzle).with_carrier(carrier);
        predict_trajectory(world, profile, &launch, ignored, max_time, step)
    }

    /// Predicts a shot fired from `location` along `direction`.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_hit_from_location<W: LineTrace + ?Sized>(
        &self,
        world: ShotWorld<'_, W>,
        profile: &ProjectileProfile,
        location: Vec3,
        direction: Vec3,
        carrier: Option<&dyn CarrierBody>,
        ignored: &[Entity],
        max_time: f32,
        step: f32,
    ) -> HitPrediction {
        let launch = self
            .launch_state_from(location, direction)
            .with_carrier(carrier);
        predict_trajectory(world, profile, &launch, ignored, max_time, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Inert;
    use crate::resources::BallisticsEnvironment;
    use crate::types::{HitResult, OpenSky, TraceParams};

    /// Wall at `x = distance`, facing the origin.
    struct Wall {
        distance: f32,
        actor: Entity,
    }

    impl LineTrace for Wall {
        fn line_trace(&self, start: Vec3, end: Vec3, params: &TraceParams<'_>) -> Option<HitResult> {
            if params.ignores(self.actor) || start.x >= self.distance || end.x < self.distance {
                return None;
            }
            let time = (self.distance - start.x) / (end.x - start.x);
            let location = start.lerp(end, time);
            Some(HitResult {
                location,
                normal: Vec3::NEG_X,
                time,
                distance: start.distance(location),
                actor: Some(self.actor),
                physical_material: None,
            })
        }
    }

    struct Carrier(Vec3);

    impl CarrierBody for Carrier {
        fn is_simulating_physics(&self) -> bool {
            true
        }

        fn linear_velocity_at_point(&self, _point: Vec3) -> Vec3 {
            self.0
        }
    }

    fn actor() -> Entity {
        World::new().spawn_empty().id()
    }

    #[test]
    fn test_launch_velocity_components() {
        let profile = ProjectileProfile::new(90.0, 110.0, Inert);
        let carrier = Carrier(Vec3::Y * 10.0);
        let launch = LaunchState::new(Vec3::ZERO, Vec3::X * 3.0)
            .with_multiplier_range(1.0, 3.0)
            .with_additional_velocity(Vec3::Z)
            .with_inherit_velocity(0.5)
            .with_carrier(Some(&carrier));

        let velocity = launch_velocity(&profile, &launch);
        assert_eq!(velocity, Vec3::new(200.0, 5.0, 1.0));
    }

    #[test]
    fn test_zero_direction_has_no_muzzle_velocity() {
        let profile = ProjectileProfile::new(500.0, 500.0, Inert);
        let launch = LaunchState::new(Vec3::ZERO, Vec3::ZERO).with_additional_velocity(Vec3::X);

        assert_eq!(launch_velocity(&profile, &launch), Vec3::X);
    }

    #[test]
    fn test_wall_hit_time_is_interpolated() {
        let env = BallisticsEnvironment::vacuum();
        let profile = ProjectileProfile::new(100.0, 100.0, Inert);
        let wall = Wall {
            distance: 25.0,
            actor: actor(),
        };
        let launch = LaunchState::new(Vec3::ZERO, Vec3::X);

        let prediction = predict_trajectory(ShotWorld::new(&wall, &env), &profile, &launch, &[], 5.0, 0.1);

        assert!(prediction.outcome.hit);
        assert!((prediction.outcome.time - 0.25).abs() < 1e-4);
        assert_eq!(prediction.outcome.actor, Some(wall.actor));
        assert_eq!(prediction.trajectory.last(), Some(&prediction.outcome.location));
        assert!((prediction.outcome.location.x - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_timeout_ends_at_max_time() {
        let env = BallisticsEnvironment::vacuum();
        let profile = ProjectileProfile::new(10.0, 10.0, Inert);
        let launch = LaunchState::new(Vec3::ZERO, Vec3::X);

        // 0.25 is not a multiple of the step; the last step is shortened
        let prediction = predict_trajectory(ShotWorld::new(&OpenSky, &env), &profile, &launch, &[], 0.25, 0.1);

        assert!(!prediction.outcome.hit);
        assert_eq!(prediction.outcome.time, 0.25);
        assert_eq!(prediction.trajectory.len(), 4);
        assert!((prediction.outcome.location.x - 2.5).abs() < 1e-4);
        assert_eq!(prediction.trajectory.last(), Some(&prediction.outcome.location));
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let env = BallisticsEnvironment::default();
        let profile = ProjectileProfile::default();
        let launch = LaunchState::new(Vec3::ZERO, Vec3::ZERO);

        for (max_time, step) in [(0.0, 0.1), (-1.0, 0.1), (0.01, 0.0), (0.01, f32::NAN)] {
            let prediction = predict_trajectory(ShotWorld::new(&OpenSky, &env), &profile, &launch, &[], max_time, step);
            assert!(!prediction.trajectory.is_empty());
            assert!(prediction.trajectory.iter().all(|p| p.is_finite()));
            assert!(prediction.outcome.time <= max_time.max(0.0));
        }
    }

    #[test]
    fn test_invalid_profile_is_empty() {
        let env = BallisticsEnvironment::default();
        let profile = ProjectileProfile::new(f32::NAN, 100.0, Inert);
        let launch = LaunchState::default();

        let prediction = predict_trajectory(ShotWorld::new(&OpenSky, &env), &profile, &launch, &[], 1.0, 0.1);
        assert!(prediction.is_empty());
        assert!(!prediction.outcome.hit);
    }

    #[test]
    fn test_trapezoidal_step_under_gravity() {
        let env = BallisticsEnvironment {
            gravity: Vec3::NEG_Y * 10.0,
            ..BallisticsEnvironment::vacuum()
        };
        let profile = ProjectileProfile::new(
            0.0,
            0.0,
            |env: &BallisticsEnvironment, _: Vec3, v: Vec3, dt: f32| v + env.gravity * dt,
        );
        let launch = LaunchState::new(Vec3::ZERO, Vec3::X);

        // Trapezoidal integration is exact for constant acceleration
        let prediction = predict_trajectory(ShotWorld::new(&OpenSky, &env), &profile, &launch, &[], 1.0, 0.25);
        assert!((prediction.outcome.location.y + 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_barrel_entry_points_agree() {
        let env = BallisticsEnvironment::default();
        let profile = ProjectileProfile::default();
        let barrel = Barrel::default().with_multiplier_range(0.9, 1.1);
        let muzzle = GlobalTransform::from(Transform::from_xyz(0.0, 2.0, 0.0));

        let from_muzzle = barrel.predict_hit(ShotWorld::new(&OpenSky, &env), &profile, &muzzle, None, &[], 1.0, 0.1);
        let from_location = barrel.predict_hit_from_location(
            ShotWorld::new(&OpenSky, &env),
            &profile,
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::NEG_Z,
            None,
            &[],
            1.0,
            0.1,
        );

        assert_eq!(from_muzzle.trajectory.len(), from_location.trajectory.len());
        assert!((from_muzzle.outcome.location - from_location.outcome.location).length() < 1e-3);
    }
}
