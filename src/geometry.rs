//! Shared geometry for view resolution.
//!
//! All resolvers work against an axis-aligned [`Aabb2`] view box and a
//! [`ScreenSize`] in pixels. What the box's units mean depends on the
//! resolver: parametric `[0,1]²` for pyramids, world units for multiscale
//! arrays and spatial trees.

use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// Axis-aligned 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Self { min, max }
    }

    /// Build a box from two corners in any order.
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    /// The parametric unit square `[0,1]²`.
    pub fn unit() -> Self {
        Self::new([0.0, 0.0], [1.0, 1.0])
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }

    /// Strict overlap test.
    ///
    /// Boxes that only touch along an edge, or whose overlap is empty, do not
    /// intersect.
    pub fn intersects(&self, other: &Aabb2) -> bool {
        (0..2).all(|axis| {
            let lo = self.min[axis].max(other.min[axis]);
            let hi = self.max[axis].min(other.max[axis]);
            lo < hi
        })
    }

    /// Whether `other` lies entirely inside this box (edges inclusive).
    pub fn contains(&self, other: &Aabb2) -> bool {
        (0..2).all(|axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }

    /// Reject non-finite, inverted or zero-extent boxes.
    pub fn validate_view(&self) -> Result<(), ViewError> {
        if !self.is_finite() {
            return Err(ViewError::NonFinite {
                min: self.min,
                max: self.max,
            });
        }
        for axis in 0..2 {
            if self.min[axis] > self.max[axis] {
                return Err(ViewError::Inverted {
                    axis,
                    min: self.min[axis],
                    max: self.max[axis],
                });
            }
            if self.min[axis] == self.max[axis] {
                return Err(ViewError::Degenerate { axis });
            }
        }
        Ok(())
    }
}

/// Pixel extent of the target surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(ViewError::InvalidScreenSize {
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn extent(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.width
        } else {
            self.height
        }
    }
}

/// A view box paired with the screen it is drawn into.
///
/// Constructed through [`Viewport::new`], which enforces `min < max` on both
/// axes, finite coordinates and a positive screen size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub view: Aabb2,
    pub screen: ScreenSize,
}

impl Viewport {
    pub fn new(view: Aabb2, screen: ScreenSize) -> Result<Self, ViewError> {
        let viewport = Self { view, screen };
        viewport.validate()?;
        Ok(viewport)
    }

    /// Re-check a viewport that arrived through deserialization.
    pub fn validate(&self) -> Result<(), ViewError> {
        self.view.validate_view()?;
        self.screen.validate()
    }

    /// Screen pixels per view unit along each axis.
    pub fn pixel_density(&self) -> [f64; 2] {
        [
            self.screen.width / self.view.width(),
            self.screen.height / self.view.height(),
        ]
    }
}
