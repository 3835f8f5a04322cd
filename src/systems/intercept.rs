//! Intercept solver - aim direction and lead for a moving target.
//!
//! Flight time depends on the aim direction and the aim direction on flight
//! time, so the solver iterates: project a shot, extrapolate the target by
//! the projected flight time, re-aim. Projections run against an
//! [`InterceptPlane`] instead of world geometry.

use bevy::prelude::*;

use crate::components::Barrel;
use crate::profile::ProjectileProfile;
use crate::resources::BallisticsEnvironment;
use crate::systems::prediction::predict_trajectory;
use crate::types::{
    AimCorrection, CarrierBody, HitOutcome, HitResult, InterceptSettings, InterceptSolution,
    LaunchState, LineTrace, ShotWorld, TraceParams,
};

/// Plane through a predicted target location, facing the shooter.
///
/// A segment "hits" the plane when it crosses from the shooter's side to
/// the far side. The crossing gives the flight time to the target's range
/// and where the shot passes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterceptPlane {
    /// Point on the plane (the predicted target location)
    pub origin: Vec3,
    /// Unit normal pointing away from the shooter; zero for a degenerate plane
    pub normal: Vec3,
}

impl InterceptPlane {
    pub fn new(shooter: Vec3, target: Vec3) -> Self {
        Self {
            origin: target,
            normal: (target - shooter).normalize_or_zero(),
        }
    }

    /// Signed distance past the plane; negative on the shooter's side.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }
}

impl LineTrace for InterceptPlane {
    fn line_trace(&self, start: Vec3, end: Vec3, _params: &TraceParams<'_>) -> Option<HitResult> {
        let before = self.signed_distance(start);
        let after = self.signed_distance(end);
        if before >= 0.0 || after < 0.0 {
            return None;
        }

        let time = before / (before - after);
        let location = start.lerp(end, time);
        Some(HitResult {
            location,
            normal: -self.normal,
            time,
            distance: start.distance(location),
            actor: None,
            physical_material: None,
        })
    }
}

/// Collision-free projection of a shot aimed along `direction` onto the
/// plane through `target`.
fn project(
    environment: &BallisticsEnvironment,
    profile: &ProjectileProfile,
    launch: &LaunchState<'_>,
    direction: Vec3,
    target: Vec3,
    settings: &InterceptSettings,
) -> HitOutcome {
    let plane = InterceptPlane::new(launch.location, target);
    predict_trajectory(
        ShotWorld::new(&plane, environment),
        profile,
        &launch.aimed(direction),
        &[],
        settings.max_time,
        settings.step,
    )
    .outcome
}

/// Solves for the direction that puts a shot from `launch.location` onto a
/// target moving at constant velocity.
///
/// `launch.direction` is ignored; the first estimate aims straight at the
/// target's current location. When the shot cannot reach the target within
/// `settings.max_time` the flight time saturates and `error` stays large.
/// An invalid profile or a non-finite shooter or target state logs a warning
/// and returns an infinite error.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::prelude::*;
///
/// let environment = BallisticsEnvironment::vacuum();
/// let profile = ProjectileProfile::new(1000.0, 1000.0, Inert);
/// let launch = LaunchState::new(Vec3::ZERO, Vec3::NEG_Z);
///
/// let solution = solve_intercept(
///     &environment,
///     &profile,
///     &launch,
///     Vec3::new(0.0, 0.0, -200.0),
///     Vec3::X * 10.0,
///     &InterceptSettings::default(),
/// );
/// assert!(solution.converged(0.05));
/// assert!(solution.aim_direction.x > 0.0);
/// ```
pub fn solve_intercept(
    environment: &BallisticsEnvironment,
    profile: &ProjectileProfile,
    launch: &LaunchState<'_>,
    target_location: Vec3,
    target_velocity: Vec3,
    settings: &InterceptSettings,
) -> InterceptSolution {
    if let Err(err) = profile.validate() {
        warn!("Intercept solve skipped: {err}");
        return InterceptSolution {
            error: f32::INFINITY,
            ..default()
        };
    }

    let start = launch.location;
    if !(start.is_finite() && target_location.is_finite() && target_velocity.is_finite()) {
        warn!("Intercept solve skipped: non-finite shooter or target state");
        return InterceptSolution {
            error: f32::INFINITY,
            ..default()
        };
    }

    let Ok(mut aim_direction) = Dir3::new(target_location - start).map(Vec3::from) else {
        // Target sits on the muzzle
        return InterceptSolution {
            aim_direction: launch.direction.normalize_or_zero(),
            predicted_target_location: target_location,
            predicted_intersection_location: start,
            predicted_flight_time: 0.0,
            error: 0.0,
        };
    };

    let mut predicted_target = target_location;
    let mut drop_offset = Vec3::ZERO;

    for _ in 0..settings.iterations {
        let shot = project(environment, profile, launch, aim_direction, predicted_target, settings);

        if settings.correction == AimCorrection::LeadAndDrop && shot.hit {
            drop_offset += predicted_target - shot.location;
        }

        predicted_target = target_location + target_velocity * shot.time;
        let aim_point = predicted_target + drop_offset;
        aim_direction = (aim_point - start).normalize_or(aim_direction);
    }

    let shot = project(environment, profile, launch, aim_direction, predicted_target, settings);
    let error = predicted_target.distance(shot.location);
    if !shot.hit {
        debug!(
            "Intercept not reached within {:.2}s, residual error {error:.2}",
            settings.max_time
        );
    }

    InterceptSolution {
        aim_direction,
        predicted_target_location: predicted_target,
        predicted_intersection_location: shot.location,
        predicted_flight_time: shot.time,
        error,
    }
}

impl Barrel {
    /// Aim solution for a shot from the muzzle transform.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_aim_direction(
        &self,
        environment: &BallisticsEnvironment,
        profile: &ProjectileProfile,
        muzzle: &GlobalTransform,
        carrier: Option<&dyn CarrierBody>,
        target_location: Vec3,
        target_velocity: Vec3,
        settings: &InterceptSettings,
    ) -> InterceptSolution {
        let launch = self.launch_state(muzzle).with_carrier(carrier);
        solve_intercept(environment, profile, &launch, target_location, target_velocity, settings)
    }

    /// Aim solution for a shot from `location`.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_aim_direction_from_location(
        &self,
        environment: &BallisticsEnvironment,
        profile: &ProjectileProfile,
        location: Vec3,
        carrier: Option<&dyn CarrierBody>,
        target_location: Vec3,
        target_velocity: Vec3,
        settings: &InterceptSettings,
    ) -> InterceptSolution {
        let launch = self
            .launch_state_from(location, target_location - location)
            .with_carrier(carrier);
        solve_intercept(environment, profile, &launch, target_location, target_velocity, settings)
    }
}
