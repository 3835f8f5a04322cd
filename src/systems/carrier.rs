//! Rigid-body carriers - physics bodies barrels are mounted on.

use bevy::prelude::*;

use crate::types::CarrierBody;

/// Snapshot of an avian rigid body's motion, read once per request.
///
/// Point velocity is `linear + angular × (point - origin)`, with `origin` the
/// body's center of rotation in world space. Only dynamic bodies count as
/// simulating physics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBodyCarrier {
    simulating: bool,
    linear: Vec3,
    angular: Vec3,
    origin: Vec3,
}

impl RigidBodyCarrier {
    /// Carrier from raw motion state.
    pub fn from_motion(simulating: bool, linear: Vec3, angular: Vec3, origin: Vec3) -> Self {
        Self {
            simulating,
            linear,
            angular,
            origin,
        }
    }
}

impl CarrierBody for RigidBodyCarrier {
    fn is_simulating_physics(&self) -> bool {
        self.simulating
    }

    fn linear_velocity_at_point(&self, point: Vec3) -> Vec3 {
        self.linear + self.angular.cross(point - self.origin)
    }
}

#[cfg(feature = "dim3")]
pub use self::dim3::Carriers;

#[cfg(feature = "dim3")]
mod dim3 {
    use avian3d::prelude::{AngularVelocity, ComputedCenterOfMass, LinearVelocity, RigidBody};
    use bevy::ecs::system::SystemParam;
    use bevy::prelude::*;

    use super::RigidBodyCarrier;

    impl RigidBodyCarrier {
        pub fn new(
            body: &RigidBody,
            linear: &LinearVelocity,
            angular: &AngularVelocity,
            origin: Vec3,
        ) -> Self {
            Self::from_motion(body.is_dynamic(), linear.0, angular.0, origin)
        }
    }

    /// Looks up the avian3d body a barrel is mounted on.
    ///
    /// Rotation is taken about the body's center of mass in world space.
    #[derive(SystemParam)]
    pub struct Carriers<'w, 's> {
        bodies: Query<
            'w,
            's,
            (
                &'static RigidBody,
                &'static LinearVelocity,
                &'static AngularVelocity,
                &'static GlobalTransform,
                Option<&'static ComputedCenterOfMass>,
            ),
        >,
    }

    impl Carriers<'_, '_> {
        pub fn get(&self, entity: Entity) -> Option<RigidBodyCarrier> {
            let (body, linear, angular, transform, center_of_mass) = self.bodies.get(entity).ok()?;
            let local = center_of_mass.map_or(Vec3::ZERO, |com| com.0);
            Some(RigidBodyCarrier::new(body, linear, angular, transform.transform_point(local)))
        }
    }
}

#[cfg(feature = "dim2")]
pub use self::dim2::Carriers2d;

#[cfg(feature = "dim2")]
mod dim2 {
    use avian2d::prelude::{AngularVelocity, ComputedCenterOfMass, LinearVelocity, RigidBody};
    use bevy::ecs::system::SystemParam;
    use bevy::prelude::*;

    use super::RigidBodyCarrier;

    impl RigidBodyCarrier {
        /// Carrier from a 2D body; rotation is about the Z axis.
        pub fn new_2d(
            body: &RigidBody,
            linear: &LinearVelocity,
            angular: &AngularVelocity,
            origin: Vec3,
        ) -> Self {
            Self::from_motion(
                body.is_dynamic(),
                linear.0.extend(0.0),
                Vec3::Z * angular.0,
                origin,
            )
        }
    }

    /// Looks up the avian2d body a barrel is mounted on.
    #[derive(SystemParam)]
    pub struct Carriers2d<'w, 's> {
        bodies: Query<
            'w,
            's,
            (
                &'static RigidBody,
                &'static LinearVelocity,
                &'static AngularVelocity,
                &'static GlobalTransform,
                Option<&'static ComputedCenterOfMass>,
            ),
        >,
    }

    impl Carriers2d<'_, '_> {
        pub fn get(&self, entity: Entity) -> Option<RigidBodyCarrier> {
            let (body, linear, angular, transform, center_of_mass) = self.bodies.get(entity).ok()?;
            let local = center_of_mass.map_or(Vec3::ZERO, |com| com.0.extend(0.0));
            Some(RigidBodyCarrier::new_2d(body, linear, angular, transform.transform_point(local)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_velocity_includes_rotation() {
        let carrier = RigidBodyCarrier::from_motion(true, Vec3::X, Vec3::Y * 2.0, Vec3::ZERO);

        // ω × r = (0, 2, 0) × (1, 0, 0) = (0, 0, -2)
        let velocity = carrier.linear_velocity_at_point(Vec3::X);
        assert_eq!(velocity, Vec3::new(1.0, 0.0, -2.0));
    }

    #[cfg(feature = "dim3")]
    #[test]
    fn test_only_dynamic_bodies_simulate() {
        use avian3d::prelude::{AngularVelocity, LinearVelocity, RigidBody};

        let dynamic = RigidBodyCarrier::new(
            &RigidBody::Dynamic,
            &LinearVelocity(Vec3::X),
            &AngularVelocity(Vec3::ZERO),
            Vec3::ZERO,
        );
        let kinematic = RigidBodyCarrier::new(
            &RigidBody::Kinematic,
            &LinearVelocity(Vec3::X),
            &AngularVelocity(Vec3::ZERO),
            Vec3::ZERO,
        );

        assert!(dynamic.is_simulating_physics());
        assert!(!kinematic.is_simulating_physics());
    }

    #[cfg(feature = "dim3")]
    #[test]
    fn test_lookup_rotates_about_center_of_mass() {
        use avian3d::prelude::{AngularVelocity, ComputedCenterOfMass, LinearVelocity, RigidBody};
        use bevy::ecs::system::RunSystemOnce;

        let mut world = World::new();
        let hull = world
            .spawn((
                RigidBody::Dynamic,
                LinearVelocity(Vec3::ZERO),
                AngularVelocity(Vec3::Y * 2.0),
                GlobalTransform::from_xyz(10.0, 0.0, 0.0),
                ComputedCenterOfMass(Vec3::X),
            ))
            .id();

        let carrier = world
            .run_system_once(move |carriers: Carriers| carriers.get(hull))
            .unwrap()
            .unwrap();

        // r = (12, 0, 0) - (11, 0, 0)
        let velocity = carrier.linear_velocity_at_point(Vec3::X * 12.0);
        assert!((velocity - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }
}
