//! Bounding-box trees and breadth-first visibility traversal.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TreeError, ViewError};
use crate::geometry::Aabb2;

/// Axis whose extent is compared against the size threshold.
pub const PRIMARY_AXIS: usize = 0;

/// Opaque payload carried by a tree node plus the number of records it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeContent<T> {
    pub payload: T,
    pub count: u64,
}

/// A node of an octree or quadtree, projected onto the view plane.
///
/// Each child's bounds lie inside its parent's bounds and each child sits one
/// level deeper than its parent. See [`SpatialTreeNode::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialTreeNode<T> {
    pub bounds: Aabb2,
    pub depth: u32,
    pub content: NodeContent<T>,
    #[serde(default = "Vec::new")]
    pub children: Vec<SpatialTreeNode<T>>,
}

impl<T> SpatialTreeNode<T> {
    pub fn new(bounds: Aabb2, depth: u32, payload: T, count: u64) -> Self {
        Self {
            bounds,
            depth,
            content: NodeContent { payload, count },
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SpatialTreeNode<T>>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Check bounds containment and depth numbering for the whole subtree.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !node.bounds.is_finite() {
                return Err(TreeError::NonFiniteBounds { depth: node.depth });
            }
            for child in &node.children {
                if child.depth != node.depth + 1 {
                    return Err(TreeError::DepthMismatch {
                        expected: node.depth + 1,
                        actual: child.depth,
                    });
                }
                if !node.bounds.contains(&child.bounds) {
                    return Err(TreeError::ChildOutsideParent { depth: child.depth });
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}

/// Breadth-first walk that only collects and expands nodes passing `keep`.
///
/// A node failing `keep` is pruned: neither it nor any descendant is
/// returned. Nodes come back in discovery order, coarse to fine.
pub fn breadth_first<'a, T, F>(
    root: &'a SpatialTreeNode<T>,
    mut keep: F,
) -> Vec<&'a SpatialTreeNode<T>>
where
    F: FnMut(&SpatialTreeNode<T>) -> bool,
{
    let mut visited = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if !keep(node) {
            continue;
        }
        visited.push(node);
        queue.extend(node.children.iter());
    }
    visited
}

/// Nodes that intersect `view` and are larger than `size_threshold`.
///
/// The threshold is compared to each node's extent along [`PRIMARY_AXIS`];
/// subtrees that would render below it are not descended into. Traversal cost
/// is bounded by the number of visible nodes, not the tree size.
///
/// Fails if `view` is non-finite, inverted or has zero extent.
pub fn visible_nodes<'a, T>(
    root: &'a SpatialTreeNode<T>,
    view: &Aabb2,
    size_threshold: f64,
) -> Result<Vec<&'a SpatialTreeNode<T>>, ViewError> {
    view.validate_view()?;
    let nodes = breadth_first(root, |node| {
        node.bounds.intersects(view) && node.bounds.extent(PRIMARY_AXIS) > size_threshold
    });
    debug!(visible = nodes.len(), size_threshold, "Resolved visible tree nodes");
    Ok(nodes)
}
