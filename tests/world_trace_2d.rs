#![cfg(feature = "dim2")]

use std::time::Duration;

use avian2d::prelude::{Collider, CollisionLayers, LayerMask, PhysicsPlugins, RigidBody};
use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_barrel_prediction::prelude::*;

const SAFE: ProfileId = ProfileId(1);

const CONCRETE: PhysicalSurface = PhysicalSurface(1);
const GLASS: PhysicalSurface = PhysicalSurface(2);

fn physics_app() -> App {
    let mut profiles = ProjectileProfiles::default();
    profiles.insert(SAFE, ProjectileProfile::new(300.0, 300.0, Inert).with_safe_launch(true));

    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        TransformPlugin,
        AssetPlugin::default(),
        bevy::scene::ScenePlugin,
        PhysicsPlugins::default(),
        BarrelPredictionPlugin,
    ))
    .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(1.0 / 60.0)))
    .insert_resource(profiles);
    app.finish();
    app
}

fn settle(app: &mut App) {
    for _ in 0..5 {
        app.update();
    }
}

fn layers(layer: u32) -> CollisionLayers {
    CollisionLayers::new(LayerMask(TraceChannel::from_layer(layer).0), LayerMask::ALL)
}

/// Concrete wall 30m down +X on layer 0.
fn spawn_wall(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            RigidBody::Static,
            Collider::rectangle(1.0, 20.0),
            layers(0),
            CONCRETE,
            Transform::from_xyz(30.0, 0.0, 0.0),
        ))
        .id()
}

#[derive(Clone, Copy)]
struct Cast {
    channel: TraceChannel,
    complexity: TraceComplexity,
    launcher: Option<Entity>,
}

impl Default for Cast {
    fn default() -> Self {
        Self {
            channel: TraceChannel::ALL,
            complexity: TraceComplexity::Simple,
            launcher: None,
        }
    }
}

/// Casts from the origin to (100, 0, 10); depth only rides along.
fn cast_down_range(In(cast): In<Cast>, world_trace: WorldTrace2d) -> Option<HitResult> {
    let profile = ProjectileProfile::new(300.0, 300.0, Inert)
        .with_trace_channel(cast.channel)
        .with_trace_complexity(cast.complexity)
        .with_safe_launch(true);
    probe(
        &world_trace,
        &profile,
        cast.launcher,
        Vec3::ZERO,
        Vec3::new(100.0, 0.0, 10.0),
        &[],
    )
}

fn cast(app: &mut App, cast: Cast) -> Option<HitResult> {
    app.world_mut()
        .run_system_once_with(cast_down_range, cast)
        .unwrap()
}

#[test]
fn test_trace_runs_in_the_xy_plane() {
    let mut app = physics_app();
    let wall = spawn_wall(&mut app);
    settle(&mut app);

    let hit = cast(&mut app, Cast::default()).unwrap();

    assert_eq!(hit.actor, Some(wall));
    assert_eq!(hit.physical_material, Some(CONCRETE));
    assert!((hit.time - 0.295).abs() < 1e-4);
    // Depth is interpolated along the full segment
    assert!((hit.location - Vec3::new(29.5, 0.0, 2.95)).length() < 1e-3);
    assert!((hit.normal - Vec3::NEG_X).length() < 1e-3);
}

#[test]
fn test_channel_and_proxy_filters() {
    let mut app = physics_app();
    let wall = spawn_wall(&mut app);
    let pane = app
        .world_mut()
        .spawn((
            RigidBody::Static,
            Collider::rectangle(1.0, 20.0),
            layers(2),
            GLASS,
            Transform::from_xyz(10.0, 0.0, 0.0),
        ))
        .id();
    let detail = app
        .world_mut()
        .spawn((
            RigidBody::Static,
            Collider::rectangle(1.0, 20.0),
            layers(0),
            CollisionProxy::Complex,
            Transform::from_xyz(20.0, 0.0, 0.0),
        ))
        .id();
    settle(&mut app);

    let everything = cast(&mut app, Cast::default()).unwrap();
    assert_eq!(everything.actor, Some(pane));
    assert_eq!(everything.physical_material, Some(GLASS));

    let terrain = Cast {
        channel: TraceChannel::from_layer(0),
        ..Cast::default()
    };
    assert_eq!(cast(&mut app, terrain).and_then(|hit| hit.actor), Some(wall));

    let detailed = Cast {
        complexity: TraceComplexity::Complex,
        ..terrain
    };
    assert_eq!(cast(&mut app, detailed).and_then(|hit| hit.actor), Some(detail));
}

#[test]
fn test_child_colliders_belong_to_their_body() {
    let mut app = physics_app();
    let wall = spawn_wall(&mut app);
    let hull = app
        .world_mut()
        .spawn((RigidBody::Static, Transform::default()))
        .with_children(|hull| {
            hull.spawn((Collider::rectangle(6.0, 2.0), layers(0), Transform::default()));
        })
        .id();
    settle(&mut app);

    let inside = cast(&mut app, Cast::default()).unwrap();
    assert_eq!(inside.actor, Some(hull));

    let launched = Cast {
        launcher: Some(hull),
        ..Cast::default()
    };
    assert_eq!(cast(&mut app, launched).and_then(|hit| hit.actor), Some(wall));
}

#[test]
fn test_mounted_barrel_never_hits_its_hull() {
    let mut app = physics_app();
    spawn_wall(&mut app);
    let mut barrel = Entity::PLACEHOLDER;
    app.world_mut()
        .spawn((
            RigidBody::Static,
            Collider::rectangle(6.0, 2.0),
            layers(0),
            Transform::default(),
        ))
        .with_children(|hull| {
            // Facing +X
            barrel = hull
                .spawn((
                    Barrel::new(SAFE),
                    Transform::from_xyz(1.0, 0.0, 0.0).looking_to(Vec3::X, Vec3::Y),
                ))
                .id();
        });
    settle(&mut app);

    app.world_mut().write_message(PredictHitRequest::new(barrel));
    app.update();
    app.update();

    let predicted = app.world().get::<PredictedTrajectory>(barrel).unwrap();
    let hit = predicted.hit.unwrap();
    assert!((hit - Vec3::new(29.5, 0.0, 0.0)).length() < 1e-3, "hit at {hit}");
}
