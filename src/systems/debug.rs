use bevy::prelude::*;

use crate::components::PredictedTrajectory;
use crate::resources::PredictionConfig;

/// Draw debug gizmos for predicted trajectories.
///
/// Draws the sampled path of each barrel's latest prediction and marks the
/// hit point, if any.
pub fn draw_predicted_trajectories(
    mut gizmos: Gizmos,
    query: Query<&PredictedTrajectory>,
    config: Res<PredictionConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for trajectory in query.iter() {
        // Need at least 2 points to draw lines
        if trajectory.points.len() >= 2 {
            gizmos.linestrip(trajectory.points.iter().copied(), Color::srgb(0.0, 1.0, 0.0));
        }

        if let Some(hit) = trajectory.hit {
            gizmos.sphere(hit, 0.1, Color::srgb(1.0, 0.0, 0.0));
        }
    }
}
