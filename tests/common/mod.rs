//! Scripted collision worlds for integration tests.

#![allow(dead_code)]

use bevy::prelude::*;
use bevy_barrel_prediction::prelude::*;

/// Fresh, distinct entity ids.
pub fn actors(count: usize) -> Vec<Entity> {
    let mut world = World::new();
    (0..count).map(|_| world.spawn_empty().id()).collect()
}

/// Solid ball.
#[derive(Clone, Copy, Debug)]
pub struct Ball {
    pub center: Vec3,
    pub radius: f32,
    pub actor: Entity,
    pub channel: TraceChannel,
}

impl Ball {
    pub fn new(center: Vec3, radius: f32, actor: Entity) -> Self {
        Self {
            center,
            radius,
            actor,
            channel: TraceChannel::ALL,
        }
    }

    /// Fraction along `start..end` where the segment enters the ball.
    /// A segment starting inside hits at `0.0`.
    fn entry(&self, start: Vec3, end: Vec3) -> Option<f32> {
        let segment = end - start;
        let offset = start - self.center;
        let c = offset.length_squared() - self.radius * self.radius;
        if c <= 0.0 {
            return Some(0.0);
        }

        let a = segment.length_squared();
        if a == 0.0 {
            return None;
        }
        let b = offset.dot(segment);
        let discriminant = b * b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let time = (-b - discriminant.sqrt()) / a;
        (0.0..=1.0).contains(&time).then_some(time)
    }
}

/// One-sided infinite plane; segments crossing from the front hit it.
#[derive(Clone, Copy, Debug)]
pub struct Slab {
    pub point: Vec3,
    pub normal: Vec3,
    pub actor: Entity,
    pub channel: TraceChannel,
}

impl Slab {
    pub fn new(point: Vec3, normal: Vec3, actor: Entity) -> Self {
        Self {
            point,
            normal: normal.normalize(),
            actor,
            channel: TraceChannel::ALL,
        }
    }

    fn entry(&self, start: Vec3, end: Vec3) -> Option<f32> {
        let before = (start - self.point).dot(self.normal);
        let after = (end - self.point).dot(self.normal);
        if before < 0.0 || after >= 0.0 {
            return None;
        }
        Some(before / (before - after))
    }
}

/// Scene of balls and slabs honoring channels and ignore lists.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub balls: Vec<Ball>,
    pub slabs: Vec<Slab>,
}

impl Scene {
    pub fn with_ball(mut self, ball: Ball) -> Self {
        self.balls.push(ball);
        self
    }

    pub fn with_slab(mut self, slab: Slab) -> Self {
        self.slabs.push(slab);
        self
    }
}

impl LineTrace for Scene {
    fn line_trace(&self, start: Vec3, end: Vec3, params: &TraceParams<'_>) -> Option<HitResult> {
        let balls = self
            .balls
            .iter()
            .filter(|ball| params.channel.intersects(ball.channel) && !params.ignores(ball.actor))
            .filter_map(|ball| Some((ball.entry(start, end)?, ball.actor, None)));
        let slabs = self
            .slabs
            .iter()
            .filter(|slab| params.channel.intersects(slab.channel) && !params.ignores(slab.actor))
            .filter_map(|slab| Some((slab.entry(start, end)?, slab.actor, Some(slab.normal))));

        let (time, actor, normal) = balls
            .chain(slabs)
            .min_by(|a, b| a.0.total_cmp(&b.0))?;
        let location = start.lerp(end, time);

        Some(HitResult {
            location,
            normal: normal.unwrap_or_else(|| (start - location).normalize_or_zero()),
            time,
            distance: start.distance(location),
            actor: Some(actor),
            physical_material: None,
        })
    }
}

/// Environment with gravity only.
pub fn airless() -> BallisticsEnvironment {
    BallisticsEnvironment {
        gravity: Vec3::new(0.0, -9.81, 0.0),
        ..BallisticsEnvironment::vacuum()
    }
}
