//! Resolution level selection by voxel pitch.
//!
//! Each level is scored by the distance between its voxel pitch and the
//! pitch the screen asks for (view units per pixel). Levels coarser than
//! requested on both plane axes have their distance multiplied by
//! [`COARSER_PENALTY`], so a finer level wins whenever the raw distances are
//! comparable.

use serde::Serialize;
use tracing::debug;

use crate::error::MultiscaleError;
use crate::geometry::Viewport;

use super::descriptor::MultiscaleDescriptor;

/// Distance multiplier for levels coarser than the desired pitch.
pub const COARSER_PENALTY: f64 = 1000.0;

/// Outcome of [`select_level`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelSelection {
    /// Index into the descriptor's levels
    pub level: usize,

    /// World units per voxel of the chosen level
    pub pitch: [f64; 2],

    /// World units per screen pixel requested by the view
    pub desired_pitch: [f64; 2],

    /// Penalized distance that won the selection
    pub score: f64,
}

/// Penalized distance between a level's pitch and the desired pitch.
pub fn pitch_score(pitch: [f64; 2], desired: [f64; 2]) -> f64 {
    let distance = (pitch[0] - desired[0]).hypot(pitch[1] - desired[1]);
    if pitch[0] > desired[0] && pitch[1] > desired[1] {
        distance * COARSER_PENALTY
    } else {
        distance
    }
}

/// Pick the level whose voxel pitch best matches the screen density.
///
/// `plane_axes` names the dataset axes mapped to the view's x and y.
/// Returns `Ok(None)` for a dataset without levels. Ties keep the first level
/// in declaration order.
///
/// # Errors
///
/// Fails for an invalid viewport or a plane axis the dataset does not declare.
pub fn select_level(
    dataset: &MultiscaleDescriptor,
    plane_axes: [&str; 2],
    viewport: &Viewport,
) -> Result<Option<LevelSelection>, MultiscaleError> {
    viewport.validate()?;
    let plane = dataset.plane_indices(plane_axes)?;

    let desired_pitch = [
        viewport.view.width() / viewport.screen.width,
        viewport.view.height() / viewport.screen.height,
    ];

    let mut best: Option<LevelSelection> = None;
    for level in 0..dataset.levels().len() {
        let Some(pitch) = dataset.voxel_pitch(level, plane) else {
            continue;
        };
        if !pitch.iter().all(|p| p.is_finite()) {
            // Zero-extent level along a plane axis.
            continue;
        }
        let score = pitch_score(pitch, desired_pitch);
        if best.map_or(true, |b| score < b.score) {
            best = Some(LevelSelection {
                level,
                pitch,
                desired_pitch,
                score,
            });
        }
    }

    if let Some(selection) = &best {
        debug!(
            level = selection.level,
            pitch = ?selection.pitch,
            desired = ?desired_pitch,
            "Selected multiscale level"
        );
    }
    Ok(best)
}
