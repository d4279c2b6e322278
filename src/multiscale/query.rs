//! Axis-keyed slice requests and their translation to native axis order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MultiscaleError;

use super::descriptor::{Axis, Level};

/// What to take along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRequest {
    /// A single fixed index
    Index(i64),
    /// Half-open interval `[start, end)`
    Interval { start: i64, end: i64 },
    /// The whole axis
    All,
}

/// Mapping from axis name to what to take along that axis.
///
/// Every axis the dataset declares must have an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SliceRequest(BTreeMap<String, AxisRequest>);

impl SliceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: impl Into<String>, request: AxisRequest) -> Self {
        self.0.insert(axis.into(), request);
        self
    }

    pub fn insert(&mut self, axis: impl Into<String>, request: AxisRequest) {
        self.0.insert(axis.into(), request);
    }

    pub fn get(&self, axis: &str) -> Option<&AxisRequest> {
        self.0.get(axis)
    }
}

/// One term of a native-order query, already clamped to the axis extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSlice {
    Index(u64),
    Range { start: u64, end: u64 },
}

impl AxisSlice {
    /// Number of elements selected along the axis.
    pub fn len(&self) -> u64 {
        match *self {
            AxisSlice::Index(_) => 1,
            AxisSlice::Range { start, end } => end - start,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the axis survives in the decoded shape.
    pub fn keeps_axis(&self) -> bool {
        matches!(self, AxisSlice::Range { .. })
    }

    fn clamp(request: AxisRequest, extent: u64) -> Self {
        let clamp = |v: i64, hi: u64| v.clamp(0, hi.min(i64::MAX as u64) as i64) as u64;
        match request {
            AxisRequest::All => AxisSlice::Range {
                start: 0,
                end: extent,
            },
            AxisRequest::Index(_) if extent == 0 => AxisSlice::Range { start: 0, end: 0 },
            AxisRequest::Index(i) => AxisSlice::Index(clamp(i, extent - 1)),
            AxisRequest::Interval { start, end } => {
                let start = clamp(start, extent);
                let end = clamp(end, extent).max(start);
                AxisSlice::Range { start, end }
            }
        }
    }
}

/// Map an axis-keyed request onto `level` in the dataset's axis order.
///
/// Indices and intervals are clamped into `[0, extent)` of each axis.
/// Request entries for axes the dataset does not declare are ignored.
///
/// # Errors
///
/// Returns [`MultiscaleError::MissingAxis`] when a declared axis has no entry,
/// and [`MultiscaleError::QueryRankMismatch`] when `level` and `axes` disagree.
pub fn build_query(
    level: &Level,
    axes: &[Axis],
    request: &SliceRequest,
) -> Result<Vec<AxisSlice>, MultiscaleError> {
    if level.shape.len() != axes.len() {
        return Err(MultiscaleError::QueryRankMismatch {
            path: level.path.clone(),
            expected: axes.len(),
            actual: level.shape.len(),
        });
    }

    let query = axes
        .iter()
        .zip(&level.shape)
        .map(|(axis, &extent)| -> Result<AxisSlice, MultiscaleError> {
            let entry = request
                .get(&axis.name)
                .ok_or_else(|| MultiscaleError::MissingAxis {
                    axis: axis.name.clone(),
                })?;
            Ok(AxisSlice::clamp(*entry, extent))
        })
        .collect::<Result<Vec<_>, MultiscaleError>>()?;

    for name in request.0.keys() {
        if !axes.iter().any(|axis| &axis.name == name) {
            debug!(axis = %name, "Ignoring request entry for undeclared axis");
        }
    }

    Ok(query)
}

/// Shape of the buffer a query decodes to: fixed-index axes are dropped.
pub fn query_shape(query: &[AxisSlice]) -> Vec<u64> {
    query
        .iter()
        .filter(|term| term.keeps_axis())
        .map(AxisSlice::len)
        .collect()
}
