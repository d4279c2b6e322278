//! Spatial tree (octree / quadtree) visibility resolution.
//!
//! Trees are traversed breadth-first with an explicit worklist, so deep trees
//! never recurse. The order of the returned nodes runs coarse to fine and is
//! meant to be used as a layering hint by the renderer.

mod tree;

pub use tree::{breadth_first, visible_nodes, NodeContent, SpatialTreeNode, PRIMARY_AXIS};
