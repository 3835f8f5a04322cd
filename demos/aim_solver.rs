use std::time::Duration;

use avian3d::prelude::*;
use bevy::app::ScheduleRunnerPlugin;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_barrel_prediction::prelude::*;

const RIFLE: ProfileId = ProfileId(1);

fn main() {
    println!("Starting headless aim solver demo...");
    println!("A turret tracks a crossing drone for 3 seconds.");

    let mut profiles = ProjectileProfiles::default();
    profiles.insert(
        RIFLE,
        ProjectileProfile::new(840.0, 860.0, DragModel::default())
            .with_trace_complexity(TraceComplexity::Simple),
    );

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins((TransformPlugin, AssetPlugin::default()))
        .add_plugins(PhysicsPlugins::default())
        .add_plugins(BarrelPredictionPlugin)
        .insert_resource(profiles)
        .insert_resource(PredictionConfig {
            step: 1.0 / 120.0,
            aim_correction: AimCorrection::LeadAndDrop,
            ..default()
        })
        .add_systems(Startup, setup_range)
        .add_systems(
            FixedUpdate,
            (fly_drone, request_aim, apply_aim, report_predictions).chain(),
        )
        .add_systems(Update, quit_after_timeout)
        .run();
}

#[derive(Component)]
struct Turret;

#[derive(Component)]
struct Drone {
    velocity: Vec3,
}

fn setup_range(mut commands: Commands) {
    // Ground
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(2000.0, 1.0, 2000.0),
        Transform::from_xyz(0.0, -0.5, 0.0),
        PhysicalSurface(1),
    ));

    // Turret on a slowly drifting hull
    commands
        .spawn((
            RigidBody::Dynamic,
            Collider::cuboid(4.0, 2.0, 6.0),
            LinearVelocity(Vec3::new(0.0, 0.0, -2.0)),
            Transform::from_xyz(0.0, 1.0, 0.0),
        ))
        .with_children(|hull| {
            hull.spawn((
                Turret,
                Barrel::new(RIFLE).with_inherit_velocity(1.0),
                Transform::from_xyz(0.0, 1.5, -3.5),
            ));
        });

    // Target drone crossing at 300m
    commands.spawn((
        Drone {
            velocity: Vec3::new(15.0, 0.0, 0.0),
        },
        RigidBody::Kinematic,
        Collider::sphere(0.5),
        Transform::from_xyz(-40.0, 25.0, -300.0),
        PhysicalSurface(2),
    ));
}

fn fly_drone(mut drones: Query<(&Drone, &mut Transform)>, time: Res<Time>) {
    for (drone, mut transform) in drones.iter_mut() {
        transform.translation += drone.velocity * time.delta_secs();
    }
}

fn request_aim(
    turret: Single<Entity, With<Turret>>,
    drone: Single<(&Drone, &Transform)>,
    mut requests: MessageWriter<AimRequest>,
) {
    let (drone, transform) = *drone;
    requests.write(
        AimRequest::new(*turret, transform.translation).with_target_velocity(drone.velocity),
    );
}

fn apply_aim(
    mut solved: MessageReader<AimSolved>,
    mut turrets: Query<&mut Transform, With<Turret>>,
    mut predictions: MessageWriter<PredictHitRequest>,
) {
    for answer in solved.read() {
        let Ok(mut transform) = turrets.get_mut(answer.barrel) else {
            continue;
        };
        let solution = answer.solution;
        if solution.aim_direction != Vec3::ZERO {
            let target = transform.translation + solution.aim_direction;
            transform.look_at(target, Vec3::Y);
        }
        println!(
            "[AIM] flight {:.3}s, intercept at {:.1?}, error {:.3}m",
            solution.predicted_flight_time, solution.predicted_target_location, solution.error
        );
        predictions.write(PredictHitRequest::new(answer.barrel));
    }
}

fn report_predictions(mut predicted: MessageReader<HitPredicted>) {
    for answer in predicted.read() {
        let outcome = answer.prediction.outcome;
        if outcome.hit {
            println!(
                "[PREDICT] hit {:?} at {:.1?} after {:.3}s",
                outcome.actor, outcome.location, outcome.time
            );
        } else {
            println!("[PREDICT] no hit within {:.1}s", outcome.time);
        }
    }
}

fn quit_after_timeout(time: Res<Time>, mut exit: MessageWriter<AppExit>) {
    if time.elapsed_secs() > 3.0 {
        println!("[FINISHED] Demo complete.");
        exit.write(AppExit::Success);
    }
}
