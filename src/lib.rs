//! # Bevy Barrel Prediction
//!
//! Ballistic hit prediction and intercept solving for weapon barrels in Bevy 0.18.
//!
//! ## Features
//! - Trapezoidal trajectory stepping with per-projectile velocity rules
//!   (gravity, RK4/Euler drag, custom guidance closures)
//! - Collision probing through avian's spatial query, with channel,
//!   trace-complexity and safe-launch filtering
//! - Iterative lead solving for moving targets, with optional drop compensation
//! - 2D and 3D support via feature flags
//! - Engine-free core: every algorithm runs against any [`types::LineTrace`]
//!
//! ## Quick Start
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_barrel_prediction::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(PredictionPluginGroup)
//!         .run();
//! }
//! ```

pub mod components;
pub mod events;
pub mod profile;
pub mod resources;
pub mod systems;
pub mod types;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::events::*;
    pub use crate::profile::*;
    pub use crate::resources::*;
    pub use crate::systems::carrier::RigidBodyCarrier;
    pub use crate::systems::intercept::{solve_intercept, InterceptPlane};
    pub use crate::systems::kinematics::DragModel;
    pub use crate::systems::prediction::{launch_velocity, predict_trajectory, MAX_STEPS, MIN_STEP};
    pub use crate::systems::probe::{probe, CollisionProbe};
    pub use crate::types::*;
    pub use crate::PredictionPluginGroup;
    pub use crate::{BarrelPredictionPlugin, PredictionDebugPlugin};

    #[cfg(feature = "dim3")]
    pub use crate::systems::probe::WorldTrace;
    #[cfg(feature = "dim2")]
    pub use crate::systems::probe::WorldTrace2d;
}

use bevy::prelude::*;

/// Plugin group with the prediction core and its debug drawing.
///
/// # Example
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_barrel_prediction::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(PredictionPluginGroup)
///         .run();
/// }
/// ```
#[derive(Default)]
pub struct PredictionPluginGroup;

impl PluginGroup for PredictionPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(BarrelPredictionPlugin)
            .add(PredictionDebugPlugin)
    }
}

/// Core prediction plugin.
///
/// Registers the barrel types, initializes [`resources::BallisticsEnvironment`],
/// [`resources::PredictionConfig`] and [`resources::ProjectileProfiles`], and
/// answers request messages in `FixedUpdate`.
///
/// # Systems
/// - `serve_prediction_requests` - Answers [`events::PredictHitRequest`] with [`events::HitPredicted`]
///   (runs once the physics spatial query pipeline exists)
/// - `serve_aim_requests` - Answers [`events::AimRequest`] with [`events::AimSolved`]
pub struct BarrelPredictionPlugin;

impl Plugin for BarrelPredictionPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::Barrel>()
            .register_type::<components::CollisionProxy>()
            .register_type::<components::PhysicalSurface>()
            .register_type::<resources::BallisticsEnvironment>()
            .register_type::<resources::PredictionConfig>()
            .init_resource::<resources::BallisticsEnvironment>()
            .init_resource::<resources::PredictionConfig>()
            .init_resource::<resources::ProjectileProfiles>()
            .add_message::<events::PredictHitRequest>()
            .add_message::<events::HitPredicted>()
            .add_message::<events::AimRequest>()
            .add_message::<events::AimSolved>();

        // 3D Physics Systems
        #[cfg(feature = "dim3")]
        {
            use avian3d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                (
                    systems::requests::serve_aim_requests,
                    systems::requests::serve_prediction_requests
                        .run_if(resource_exists::<SpatialQueryPipeline>),
                ),
            );
        }

        // 2D Physics Systems
        #[cfg(feature = "dim2")]
        {
            use avian2d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                (
                    systems::requests::serve_aim_requests_2d,
                    systems::requests::serve_prediction_requests_2d
                        .run_if(resource_exists::<SpatialQueryPipeline>),
                ),
            );
        }
    }
}

/// Debug plugin drawing the latest predicted trajectory of each barrel.
pub struct PredictionDebugPlugin;

impl Plugin for PredictionDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, systems::debug::draw_predicted_trajectories);
    }
}
