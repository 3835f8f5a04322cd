//! Collision probe - one straight-line query per simulated step.
//!
//! [`CollisionProbe`] applies a projectile profile's channel, complexity and
//! safe-launch policy to a [`LineTrace`] service. [`WorldTrace`] (and
//! [`WorldTrace2d`]) implement that service on top of avian's spatial query.

use bevy::prelude::*;

use crate::profile::ProjectileProfile;
use crate::types::{HitResult, LineTrace, TraceChannel, TraceComplexity, TraceParams};

/// Line queries for one projectile profile and launcher.
///
/// The ignore set is built once: the launcher first (when the profile asks
/// for a safe launch), then the caller's ignore list.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::prelude::*;
///
/// let profile = ProjectileProfile::default();
/// let probe = CollisionProbe::new(&OpenSky, &profile, Some(Entity::PLACEHOLDER), &[]);
/// assert_eq!(probe.ignored(), &[Entity::PLACEHOLDER]);
/// assert!(probe.trace(Vec3::ZERO, Vec3::X).is_none());
/// ```
pub struct CollisionProbe<'a, W: ?Sized> {
    world: &'a W,
    channel: TraceChannel,
    complexity: TraceComplexity,
    ignored: Vec<Entity>,
}

impl<'a, W: LineTrace + ?Sized> CollisionProbe<'a, W> {
    pub fn new(
        world: &'a W,
        profile: &ProjectileProfile,
        launcher: Option<Entity>,
        ignored: &[Entity],
    ) -> Self {
        let mut ignore_set = Vec::with_capacity(ignored.len() + 1);
        if profile.safe_launch {
            ignore_set.extend(launcher);
        }
        ignore_set.extend_from_slice(ignored);

        Self {
            world,
            channel: profile.trace_channel,
            complexity: profile.trace_complexity,
            ignored: ignore_set,
        }
    }

    /// Actors this probe passes through.
    pub fn ignored(&self) -> &[Entity] {
        &self.ignored
    }

    /// Nearest blocking hit between `start` and `end`.
    pub fn trace(&self, start: Vec3, end: Vec3) -> Option<HitResult> {
        let params = TraceParams {
            channel: self.channel,
            complexity: self.complexity,
            return_physical_material: true,
            ignored: &self.ignored,
        };
        self.world.line_trace(start, end, &params)
    }
}

/// Single probe between two points, see [`CollisionProbe`].
pub fn probe<W: LineTrace + ?Sized>(
    world: &W,
    profile: &ProjectileProfile,
    launcher: Option<Entity>,
    start: Vec3,
    end: Vec3,
    ignored: &[Entity],
) -> Option<HitResult> {
    CollisionProbe::new(world, profile, launcher, ignored).trace(start, end)
}

/// Segments shorter than this are never traced.
const MIN_TRACE_LENGTH: f32 = 1e-6;

#[cfg(feature = "dim3")]
pub use self::dim3::WorldTrace;

#[cfg(feature = "dim3")]
mod dim3 {
    use avian3d::prelude::{ColliderOf, LayerMask, SpatialQuery, SpatialQueryFilter};
    use bevy::ecs::system::SystemParam;
    use bevy::prelude::*;

    use super::MIN_TRACE_LENGTH;
    use crate::components::{CollisionProxy, PhysicalSurface};
    use crate::types::{HitResult, LineTrace, TraceParams};

    /// [`LineTrace`] over the avian3d spatial query pipeline.
    ///
    /// Channels map to collision layer masks and [`CollisionProxy`] restricts
    /// colliders to one trace complexity. A collider attached to a rigid body
    /// reports that body as the hit actor, and is skipped when the body is
    /// ignored. [`PhysicalSurface`] is read from the collider, then its body.
    #[derive(SystemParam)]
    pub struct WorldTrace<'w, 's> {
        spatial_query: SpatialQuery<'w, 's>,
        attachments: Query<'w, 's, &'static ColliderOf>,
        proxies: Query<'w, 's, &'static CollisionProxy>,
        surfaces: Query<'w, 's, &'static PhysicalSurface>,
    }

    impl WorldTrace<'_, '_> {
        fn body_ignored(&self, collider: Entity, ignored: &[Entity]) -> bool {
            self.attachments
                .get(collider)
                .is_ok_and(|attached| ignored.contains(&attached.body))
        }

        fn owning_actor(&self, collider: Entity) -> Entity {
            self.attachments
                .get(collider)
                .map_or(collider, |attached| attached.body)
        }

        fn surface(&self, collider: Entity, actor: Entity) -> Option<PhysicalSurface> {
            self.surfaces
                .get(collider)
                .or_else(|_| self.surfaces.get(actor))
                .ok()
                .copied()
        }
    }

    impl LineTrace for WorldTrace<'_, '_> {
        fn line_trace(&self, start: Vec3, end: Vec3, params: &TraceParams<'_>) -> Option<HitResult> {
            let segment = end - start;
            let length = segment.length();
            if length < MIN_TRACE_LENGTH {
                return None;
            }
            let direction = Dir3::new(segment).ok()?;

            let filter = SpatialQueryFilter::from_mask(LayerMask(params.channel.0))
                .with_excluded_entities(params.ignored.iter().copied());
            let (complexity, ignored) = (params.complexity, params.ignored);

            let hit = self.spatial_query.cast_ray_predicate(
                start,
                direction,
                length,
                true, // solid
                &filter,
                &|entity| {
                    !self.body_ignored(entity, ignored)
                        && self
                            .proxies
                            .get(entity)
                            .map_or(true, |proxy| proxy.accepts(complexity))
                },
            )?;

            let location = start + *direction * hit.distance;
            let actor = self.owning_actor(hit.entity);
            let physical_material = if params.return_physical_material {
                self.surface(hit.entity, actor)
            } else {
                None
            };

            Some(HitResult {
                location,
                normal: hit.normal,
                time: (hit.distance / length).clamp(0.0, 1.0),
                distance: hit.distance,
                actor: Some(actor),
                physical_material,
            })
        }
    }
}

#[cfg(feature = "dim2")]
pub use self::dim2::WorldTrace2d;

#[cfg(feature = "dim2")]
mod dim2 {
    use avian2d::prelude::{ColliderOf, LayerMask, SpatialQuery, SpatialQueryFilter};
    use bevy::ecs::system::SystemParam;
    use bevy::prelude::*;

    use super::MIN_TRACE_LENGTH;
    use crate::components::{CollisionProxy, PhysicalSurface};
    use crate::types::{HitResult, LineTrace, TraceParams};

    /// [`LineTrace`] over the avian2d spatial query pipeline.
    ///
    /// Traces the segment projected onto the XY plane; the Z coordinate of
    /// the hit is interpolated along the full 3D segment.
    #[derive(SystemParam)]
    pub struct WorldTrace2d<'w, 's> {
        spatial_query: SpatialQuery<'w, 's>,
        attachments: Query<'w, 's, &'static ColliderOf>,
        proxies: Query<'w, 's, &'static CollisionProxy>,
        surfaces: Query<'w, 's, &'static PhysicalSurface>,
    }

    impl WorldTrace2d<'_, '_> {
        fn body_ignored(&self, collider: Entity, ignored: &[Entity]) -> bool {
            self.attachments
                .get(collider)
                .is_ok_and(|attached| ignored.contains(&attached.body))
        }

        fn owning_actor(&self, collider: Entity) -> Entity {
            self.attachments
                .get(collider)
                .map_or(collider, |attached| attached.body)
        }

        fn surface(&self, collider: Entity, actor: Entity) -> Option<PhysicalSurface> {
            self.surfaces
                .get(collider)
                .or_else(|_| self.surfaces.get(actor))
                .ok()
                .copied()
        }
    }

    impl LineTrace for WorldTrace2d<'_, '_> {
        fn line_trace(&self, start: Vec3, end: Vec3, params: &TraceParams<'_>) -> Option<HitResult> {
            let segment = (end - start).truncate();
            let length = segment.length();
            if length < MIN_TRACE_LENGTH {
                return None;
            }
            let direction = Dir2::new(segment).ok()?;

            let filter = SpatialQueryFilter::from_mask(LayerMask(params.channel.0))
                .with_excluded_entities(params.ignored.iter().copied());
            let (complexity, ignored) = (params.complexity, params.ignored);

            let hit = self.spatial_query.cast_ray_predicate(
                start.truncate(),
                direction,
                length,
                true, // solid
                &filter,
                &|entity| {
                    !self.body_ignored(entity, ignored)
                        && self
                            .proxies
                            .get(entity)
                            .map_or(true, |proxy| proxy.accepts(complexity))
                },
            )?;

            let time = (hit.distance / length).clamp(0.0, 1.0);
            let location = start.lerp(end, time);
            let actor = self.owning_actor(hit.entity);
            let physical_material = if params.return_physical_material {
                self.surface(hit.entity, actor)
            } else {
                None
            };

            Some(HitResult {
                location,
                normal: hit.normal.extend(0.0),
                time,
                distance: start.distance(location),
                actor: Some(actor),
                physical_material,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Inert;
    use crate::types::OpenSky;

    /// Records the parameters of every trace it answers.
    #[derive(Default)]
    struct Recorder {
        seen: std::cell::RefCell<Vec<(TraceChannel, TraceComplexity, bool, Vec<Entity>)>>,
    }

    impl LineTrace for Recorder {
        fn line_trace(&self, _start: Vec3, _end: Vec3, params: &TraceParams<'_>) -> Option<HitResult> {
            self.seen.borrow_mut().push((
                params.channel,
                params.complexity,
                params.return_physical_material,
                params.ignored.to_vec(),
            ));
            None
        }
    }

    fn entities(count: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..count).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn test_safe_launch_ignores_launcher_first() {
        let ids = entities(3);
        let profile = ProjectileProfile::new(100.0, 100.0, Inert).with_safe_launch(true);
        let collision_probe = CollisionProbe::new(&OpenSky, &profile, Some(ids[0]), &ids[1..]);

        assert_eq!(collision_probe.ignored(), &ids[..]);
    }

    #[test]
    fn test_unsafe_launch_keeps_launcher_collidable() {
        let ids = entities(2);
        let profile = ProjectileProfile::new(100.0, 100.0, Inert).with_safe_launch(false);
        let recorder = Recorder::default();

        probe(&recorder, &profile, Some(ids[0]), Vec3::ZERO, Vec3::X, &ids[1..]);

        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].3, vec![ids[1]]);
    }

    #[test]
    fn test_probe_forwards_profile_filters() {
        let profile = ProjectileProfile::new(100.0, 100.0, Inert)
            .with_trace_channel(TraceChannel::from_layer(2))
            .with_trace_complexity(TraceComplexity::Complex);
        let recorder = Recorder::default();

        probe(&recorder, &profile, None, Vec3::ZERO, Vec3::X, &[]);

        let seen = recorder.seen.borrow();
        assert_eq!(seen[0].0, TraceChannel::from_layer(2));
        assert_eq!(seen[0].1, TraceComplexity::Complex);
        assert!(seen[0].2, "physical material is always requested");
    }
}
