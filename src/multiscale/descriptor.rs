//! Multiscale array descriptors.
//!
//! The metadata shape follows the OME-NGFF multiscales layout:
//!
//! ```json
//! {
//!   "axes": [{"name": "z", "type": "space", "unit": "micrometer"}, ...],
//!   "datasets": [
//!     {
//!       "path": "0",
//!       "coordinateTransformations": [{"type": "scale", "scale": [1, 1, 1]}],
//!       "shape": [64, 1024, 1024]
//!     },
//!     ...
//!   ]
//! }
//! ```
//!
//! Only `scale` transforms are interpreted. Other transform kinds are kept
//! by name and otherwise ignored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::MultiscaleError;

/// A named dimension of a multiscale dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,

    /// Axis kind, e.g. "space", "time" or "channel"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Axis {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            unit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransformation {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub path: String,

    #[serde(default)]
    pub coordinate_transformations: Vec<CoordinateTransformation>,

    pub shape: Vec<u64>,
}

/// Raw multiscale metadata as read from a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiscaleMetadata {
    pub axes: Vec<Axis>,
    pub datasets: Vec<DatasetMetadata>,
}

/// One resolution level of a multiscale array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub path: String,

    /// Voxel extent per axis, in dataset axis order
    pub shape: Vec<u64>,

    /// World units per voxel per axis, 1.0 where no scale is declared
    pub scale: Vec<f64>,
}

impl Level {
    pub fn new(path: impl Into<String>, shape: Vec<u64>, scale: Vec<f64>) -> Self {
        Self {
            path: path.into(),
            shape,
            scale,
        }
    }

    /// Level with unit scale on every axis.
    pub fn unscaled(path: impl Into<String>, shape: Vec<u64>) -> Self {
        let scale = vec![1.0; shape.len()];
        Self::new(path, shape, scale)
    }

    fn from_metadata(dataset: &DatasetMetadata) -> Self {
        let mut scale = vec![1.0; dataset.shape.len()];
        for transform in &dataset.coordinate_transformations {
            if transform.kind != "scale" {
                continue;
            }
            if let Some(factors) = &transform.scale {
                for (s, f) in scale.iter_mut().zip(factors) {
                    *s *= f;
                }
            }
        }
        Self::new(dataset.path.clone(), dataset.shape.clone(), scale)
    }
}

/// Validated multiscale dataset description.
///
/// Axis names are unique and every level has one shape and scale entry per
/// axis. Levels keep the order they were declared in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiscaleDescriptor {
    axes: Vec<Axis>,
    levels: Vec<Level>,
}

impl MultiscaleDescriptor {
    pub fn new(axes: Vec<Axis>, levels: Vec<Level>) -> Result<Self, MultiscaleError> {
        let mut seen = HashSet::new();
        for axis in &axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(MultiscaleError::DuplicateAxis {
                    axis: axis.name.clone(),
                });
            }
        }

        for (index, level) in levels.iter().enumerate() {
            for rank in [level.shape.len(), level.scale.len()] {
                if rank != axes.len() {
                    return Err(MultiscaleError::RankMismatch {
                        level: index,
                        expected: axes.len(),
                        actual: rank,
                    });
                }
            }
        }

        Ok(Self { axes, levels })
    }

    pub fn from_metadata(metadata: &MultiscaleMetadata) -> Result<Self, MultiscaleError> {
        let levels = metadata.datasets.iter().map(Level::from_metadata).collect();
        Self::new(metadata.axes.clone(), levels)
    }

    pub fn from_json(json: &str) -> Result<Self, MultiscaleError> {
        let metadata: MultiscaleMetadata =
            serde_json::from_str(json).map_err(|e| MultiscaleError::Metadata(e.to_string()))?;
        Self::from_metadata(&metadata)
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Result<&Level, MultiscaleError> {
        self.levels
            .get(index)
            .ok_or(MultiscaleError::InvalidLevel {
                level: index,
                levels: self.levels.len(),
            })
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|axis| axis.name == name)
    }

    /// Resolve two plane axis names to dataset axis indices.
    pub fn plane_indices(&self, plane_axes: [&str; 2]) -> Result<[usize; 2], MultiscaleError> {
        let lookup = |name: &str| {
            self.axis_index(name)
                .ok_or_else(|| MultiscaleError::UnknownPlaneAxis {
                    axis: name.to_string(),
                })
        };
        Ok([lookup(plane_axes[0])?, lookup(plane_axes[1])?])
    }

    /// Level with the most voxels in the plane. Ties keep the earliest level.
    pub fn finest_level(&self, plane: [usize; 2]) -> Option<usize> {
        let mut best: Option<(usize, u128)> = None;
        for (index, level) in self.levels.iter().enumerate() {
            let voxels = u128::from(level.shape[plane[0]]) * u128::from(level.shape[plane[1]]);
            if best.map_or(true, |(_, most)| voxels > most) {
                best = Some((index, voxels));
            }
        }
        best.map(|(index, _)| index)
    }

    /// World-unit size of the plane, measured at the finest level.
    pub fn plane_size(&self, plane: [usize; 2]) -> Option<[f64; 2]> {
        let finest = &self.levels[self.finest_level(plane)?];
        Some(plane.map(|axis| finest.shape[axis] as f64 * finest.scale[axis]))
    }

    /// World units per voxel of `level` along the two plane axes.
    pub fn voxel_pitch(&self, level: usize, plane: [usize; 2]) -> Option<[f64; 2]> {
        let size = self.plane_size(plane)?;
        let level = self.levels.get(level)?;
        Some([
            size[0] / level.shape[plane[0]] as f64,
            size[1] / level.shape[plane[1]] as f64,
        ])
    }
}
