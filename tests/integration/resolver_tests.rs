//! Resolver integration tests.
//!
//! Tests verify:
//! - Overlapping tile partitions cover each layer exactly
//! - Layer choice is monotone in screen density and bounded by the finest layer
//! - Level selection never trades a finer level for a coarser one
//! - Visible nodes never include pruned subtrees
//! - A full view-to-pixels pass: select level, build query, decode

use std::time::Duration;

use lod_streamer::geometry::{Aabb2, ScreenSize, Viewport};
use lod_streamer::multiscale::{
    build_query, query_shape, select_level, Axis, AxisRequest, Level, MultiscaleDescriptor,
    SliceRequest,
};
use lod_streamer::pyramid::{first_suitable_layer, resolve_tiles, tile_with_overlap};
use lod_streamer::spatial::{visible_nodes, SpatialTreeNode};
use lod_streamer::{DecodeDispatcher, ShapeFramingDecoder, SliceChunk};

use super::test_utils::{quadtree, reference_pyramid, volume_metadata, MemorySource, MemoryVolume};

// =============================================================================
// Pyramid
// =============================================================================

#[test]
fn test_tile_partition_covers_every_layer() {
    let pyramid = reference_pyramid();
    for layer in 0..=pyramid.max_layer() {
        let size = pyramid.layer_dimensions(layer);
        for total in [size.width, size.height] {
            let tiles = tile_with_overlap(total, pyramid.tile_size_px, pyramid.overlap_px);
            assert_eq!(tiles.first().map(|t| t.start), Some(0));
            assert_eq!(tiles.last().map(|t| t.end), Some(total));
            for pair in tiles.windows(2) {
                let overlap = pair[0].end - pair[1].start;
                assert_eq!(overlap, 2 * pyramid.overlap_px, "layer {} total {}", layer, total);
            }
        }
    }
}

#[test]
fn test_layer_choice_is_monotone_and_bounded() {
    let width = reference_pyramid().full_image_size.width;
    let max = reference_pyramid().max_layer();
    let mut previous = 0;
    for screen in (1..20_000).step_by(37) {
        let layer = first_suitable_layer(width, f64::from(screen));
        assert!(layer >= previous, "screen {} went from {} to {}", screen, previous, layer);
        assert!(layer <= max);
        previous = layer;
    }
    assert_eq!(first_suitable_layer(width, 512.0), 9);
    assert_eq!(first_suitable_layer(width, 255.0), 8);
}

#[test]
fn test_zoomed_view_selects_fine_tiles() {
    let pyramid = reference_pyramid();
    // A 1/16 wide window on a 1024px screen needs 16384px of image width.
    let viewport = Viewport::new(
        Aabb2::new([0.5, 0.5], [0.5625, 0.5625]),
        ScreenSize::new(1024.0, 1024.0),
    )
    .unwrap();
    let tiles = resolve_tiles(&pyramid, &viewport).unwrap();

    let (base, rest) = tiles.split_first().unwrap();
    assert_eq!(base.layer, pyramid.base_layer());
    assert!(!rest.is_empty());
    for tile in rest {
        assert_eq!(tile.layer, pyramid.max_layer());
        assert!(tile.relative_box.intersects(&viewport.view));
    }
}

// =============================================================================
// Multiscale
// =============================================================================

#[test]
fn test_prefers_finer_level_over_closer_coarser_one() {
    let dataset = MultiscaleDescriptor::new(
        vec![Axis::new("y"), Axis::new("x")],
        vec![
            Level::unscaled("0", vec![1000, 1000]),
            Level::unscaled("1", vec![100, 100]),
        ],
    )
    .unwrap();
    // Desired pitch 9: level 1 (pitch 10) is closer but coarser.
    let viewport = Viewport::new(
        Aabb2::new([0.0, 0.0], [900.0, 900.0]),
        ScreenSize::new(100.0, 100.0),
    )
    .unwrap();

    let selection = select_level(&dataset, ["x", "y"], &viewport).unwrap().unwrap();
    assert_eq!(selection.level, 0);
}

#[tokio::test]
async fn test_view_to_pixels() {
    let metadata = volume_metadata();
    let dataset = MultiscaleDescriptor::from_metadata(&metadata).unwrap();

    // 256 world units on 100 pixels: level 1 (pitch 2) beats level 2 (pitch 4).
    let viewport = Viewport::new(
        Aabb2::new([0.0, 0.0], [256.0, 256.0]),
        ScreenSize::new(100.0, 100.0),
    )
    .unwrap();
    let selection = select_level(&dataset, ["x", "y"], &viewport).unwrap().unwrap();
    assert_eq!(selection.level, 1);

    let level = dataset.level(selection.level).unwrap();
    let request = SliceRequest::new()
        .with("z", AxisRequest::Index(3))
        .with("y", AxisRequest::Interval { start: 16, end: 48 })
        .with("x", AxisRequest::All)
        .with("t", AxisRequest::Index(0));
    let query = build_query(level, dataset.axes(), &request).unwrap();
    assert_eq!(query_shape(&query), vec![32, 128]);

    let volume = MemoryVolume::patterned(level.shape.clone());
    let expected = volume.gather(&query);
    let source = MemorySource::new().with_volume("cells", selection.level, volume);
    let dispatcher = DecodeDispatcher::new(ShapeFramingDecoder::new(source, 1), 2);

    let handle = dispatcher.submit(SliceChunk::new("cells", selection.level, query), None);
    let slice = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slice.shape, vec![32, 128]);
    assert_eq!(slice.data.as_ref(), expected.as_slice());
    dispatcher.shutdown().await;
}

// =============================================================================
// Spatial tree
// =============================================================================

fn descendants<'a, T>(node: &'a SpatialTreeNode<T>, out: &mut Vec<&'a SpatialTreeNode<T>>) {
    for child in &node.children {
        out.push(child);
        descendants(child, out);
    }
}

#[test]
fn test_visible_nodes_respect_pruning() {
    let tree = quadtree(Aabb2::new([0.0, 0.0], [64.0, 64.0]), 0, 5, String::new());
    let views = [
        Aabb2::new([10.0, 10.0], [30.0, 20.0]),
        Aabb2::new([0.0, 0.0], [64.0, 64.0]),
        Aabb2::new([63.0, 0.0], [100.0, 1.0]),
        Aabb2::new([-10.0, -10.0], [-1.0, -1.0]),
    ];

    for view in &views {
        for threshold in [0.5, 3.0, 10.0, 40.0] {
            let visible = visible_nodes(&tree, view, threshold).unwrap();
            let visible_paths: Vec<&str> =
                visible.iter().map(|n| n.content.payload.as_str()).collect();

            for node in &visible {
                assert!(node.bounds.intersects(view));
                assert!(node.bounds.width() > threshold);
            }

            // Nothing below a pruned node is ever returned.
            let mut all = vec![&tree];
            descendants(&tree, &mut all);
            for node in all {
                let pruned =
                    !(node.bounds.intersects(view) && node.bounds.width() > threshold);
                if !pruned {
                    continue;
                }
                let mut below = Vec::new();
                descendants(node, &mut below);
                for child in below {
                    assert!(!visible_paths.contains(&child.content.payload.as_str()));
                }
            }

            // Breadth-first: depths never decrease.
            assert!(visible.windows(2).all(|w| w[0].depth <= w[1].depth));
        }
    }
}
