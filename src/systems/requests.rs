//! Systems answering prediction and aim requests for barrel entities.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::components::{Barrel, PredictedTrajectory};
use crate::events::{AimRequest, AimSolved, HitPredicted, LaunchOrigin, PredictHitRequest};
use crate::profile::ProjectileProfile;
use crate::resources::{BallisticsEnvironment, PredictionConfig, ProjectileProfiles};
use crate::systems::carrier::RigidBodyCarrier;
use crate::types::{CarrierBody, HitPrediction, InterceptSolution, LineTrace, ShotWorld};

/// Barrel entity resolved against the profile registry.
struct ResolvedBarrel<'a> {
    barrel: Barrel,
    muzzle: &'a GlobalTransform,
    parent: Option<Entity>,
    profile: &'a ProjectileProfile,
}

/// Everything a request needs besides world collision and carrier bodies.
#[derive(SystemParam)]
pub struct BarrelContext<'w, 's> {
    barrels: Query<
        'w,
        's,
        (
            &'static Barrel,
            &'static GlobalTransform,
            Option<&'static ChildOf>,
        ),
    >,
    parents: Query<'w, 's, &'static ChildOf>,
    profiles: Res<'w, ProjectileProfiles>,
    environment: Res<'w, BallisticsEnvironment>,
    config: Res<'w, PredictionConfig>,
}

impl BarrelContext<'_, '_> {
    fn resolve(&self, entity: Entity) -> Option<ResolvedBarrel<'_>> {
        let Ok((barrel, muzzle, child_of)) = self.barrels.get(entity) else {
            warn!("Prediction request for {entity:?}, which has no Barrel");
            return None;
        };

        let profile = match self.profiles.get(barrel.profile) {
            Ok(profile) => profile,
            Err(err) => {
                warn!("Prediction request for barrel {entity:?}: {err}");
                return None;
            }
        };

        // Without an explicit owner the whole mounted hierarchy launches
        let mut barrel = barrel.clone();
        if barrel.owner.is_none() {
            barrel.owner = Some(self.hierarchy_root(entity));
        }

        Some(ResolvedBarrel {
            barrel,
            muzzle,
            parent: child_of.map(ChildOf::parent),
            profile,
        })
    }

    fn hierarchy_root(&self, mut entity: Entity) -> Entity {
        while let Ok(child_of) = self.parents.get(entity) {
            entity = child_of.parent();
        }
        entity
    }

    /// Hit prediction for `request`, or `None` when the barrel cannot be resolved.
    pub fn predict<W: LineTrace + ?Sized>(
        &self,
        request: &PredictHitRequest,
        trace: &W,
        carrier_of: impl Fn(Entity) -> Option<RigidBodyCarrier>,
    ) -> Option<HitPrediction> {
        let shot = self.resolve(request.barrel)?;
        let carrier = shot.parent.and_then(carrier_of);
        let carrier = carrier.as_ref().map(|body| body as &dyn CarrierBody);
        let world = ShotWorld::new(trace, &self.environment);
        let (max_time, step) = (self.config.max_time, self.config.step);

        let prediction = match request.origin {
            LaunchOrigin::Muzzle => shot.barrel.predict_hit(
                world,
                shot.profile,
                shot.muzzle,
                carrier,
                &request.ignored,
                max_time,
                step,
            ),
            LaunchOrigin::Location {
                location,
                direction,
            } => shot.barrel.predict_hit_from_location(
                world,
                shot.profile,
                location,
                direction,
                carrier,
                &request.ignored,
                max_time,
                step,
            ),
        };
        Some(prediction)
    }

    /// Aim solution for `request`, or `None` when the barrel cannot be resolved.
    pub fn solve(
        &self,
        request: &AimRequest,
        carrier_of: impl Fn(Entity) -> Option<RigidBodyCarrier>,
    ) -> Option<InterceptSolution> {
        let shot = self.resolve(request.barrel)?;
        let carrier = shot.parent.and_then(carrier_of);
        let carrier = carrier.as_ref().map(|body| body as &dyn CarrierBody);
        let settings = self.config.intercept_settings();

        let solution = match request.origin {
            None => shot.barrel.calculate_aim_direction(
                &self.environment,
                shot.profile,
                shot.muzzle,
                carrier,
                request.target_location,
                request.target_velocity,
                &settings,
            ),
            Some(location) => shot.barrel.calculate_aim_direction_from_location(
                &self.environment,
                shot.profile,
                location,
                carrier,
                request.target_location,
                request.target_velocity,
                &settings,
            ),
        };
        Some(solution)
    }
}

fn answer_predictions<W: LineTrace + ?Sized>(
    commands: &mut Commands,
    requests: &mut MessageReader<PredictHitRequest>,
    answers: &mut MessageWriter<HitPredicted>,
    context: &BarrelContext,
    trace: &W,
    carrier_of: impl Fn(Entity) -> Option<RigidBodyCarrier> + Copy,
) {
    for request in requests.read() {
        let prediction = match context.predict(request, trace, carrier_of) {
            Some(prediction) => {
                commands
                    .entity(request.barrel)
                    .try_insert(PredictedTrajectory::from(&prediction));
                prediction
            }
            None => HitPrediction::default(),
        };

        answers.write(HitPredicted {
            barrel: request.barrel,
            prediction,
        });
    }
}

fn answer_aims(
    requests: &mut MessageReader<AimRequest>,
    answers: &mut MessageWriter<AimSolved>,
    context: &BarrelContext,
    carrier_of: impl Fn(Entity) -> Option<RigidBodyCarrier> + Copy,
) {
    for request in requests.read() {
        let solution = context
            .solve(request, carrier_of)
            .unwrap_or(InterceptSolution {
                error: f32::INFINITY,
                ..default()
            });

        answers.write(AimSolved {
            barrel: request.barrel,
            solution,
        });
    }
}

/// Serves [`PredictHitRequest`]s against the avian3d spatial query.
#[cfg(feature = "dim3")]
pub fn serve_prediction_requests(
    mut commands: Commands,
    mut requests: MessageReader<PredictHitRequest>,
    mut answers: MessageWriter<HitPredicted>,
    context: BarrelContext,
    carriers: crate::systems::carrier::Carriers,
    world_trace: crate::systems::probe::WorldTrace,
) {
    answer_predictions(
        &mut commands,
        &mut requests,
        &mut answers,
        &context,
        &world_trace,
        |entity| carriers.get(entity),
    );
}

/// Serves [`AimRequest`]s, inheriting velocity from avian3d carrier bodies.
#[cfg(feature = "dim3")]
pub fn serve_aim_requests(
    mut requests: MessageReader<AimRequest>,
    mut answers: MessageWriter<AimSolved>,
    context: BarrelContext,
    carriers: crate::systems::carrier::Carriers,
) {
    answer_aims(&mut requests, &mut answers, &context, |entity| {
        carriers.get(entity)
    });
}

/// Serves [`PredictHitRequest`]s against the avian2d spatial query.
#[cfg(feature = "dim2")]
pub fn serve_prediction_requests_2d(
    mut commands: Commands,
    mut requests: MessageReader<PredictHitRequest>,
    mut answers: MessageWriter<HitPredicted>,
    context: BarrelContext,
    carriers: crate::systems::carrier::Carriers2d,
    world_trace: crate::systems::probe::WorldTrace2d,
) {
    answer_predictions(
        &mut commands,
        &mut requests,
        &mut answers,
        &context,
        &world_trace,
        |entity| carriers.get(entity),
    );
}

/// Serves [`AimRequest`]s, inheriting velocity from avian2d carrier bodies.
#[cfg(feature = "dim2")]
pub fn serve_aim_requests_2d(
    mut requests: MessageReader<AimRequest>,
    mut answers: MessageWriter<AimSolved>,
    context: BarrelContext,
    carriers: crate::systems::carrier::Carriers2d,
) {
    answer_aims(&mut requests, &mut answers, &context, |entity| {
        carriers.get(entity)
    });
}
