mod common;

use depthdeblur_core::error::DeblurError;
use depthdeblur_core::frame::View;
use depthdeblur_core::region_tree::RegionTree;
use ndarray::Array2;

use common::banded_disparity;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[test]
fn test_twelve_layers_reduce_to_three_roots() {
    let tree = RegionTree::build(banded_disparity(4, 12, 12), 12, 3).unwrap();
    assert_eq!(tree.len(), 12 + 6 + 3);
    assert_eq!(tree.top_level_ids(), &[18, 19, 20]);
    assert_eq!(tree.node(18).unwrap().layers, 0..4);
    assert_eq!(tree.node(12).unwrap().children, Some((0, 1)));
}

#[test]
fn test_odd_node_is_carried_up() {
    // 6 -> 3 -> (2 + carried) -> 1
    let tree = RegionTree::build(banded_disparity(4, 6, 6), 6, 1).unwrap();
    let (a, b) = tree.node(tree.top_level_ids()[0]).unwrap().children.unwrap();
    let carried = tree.node(b).unwrap();
    assert_eq!(carried.level, 1);
    assert_eq!(carried.layers, 4..6);
    assert_eq!(tree.node(a).unwrap().layers, 0..4);
}

#[test]
fn test_zero_layers_give_an_empty_forest() {
    let tree = RegionTree::build(banded_disparity(4, 4, 0), 0, 3).unwrap();
    assert!(tree.is_empty());
    assert!(tree.top_level_ids().is_empty());
}

#[test]
fn test_leaf_count_equals_layers() {
    for layers in [2, 4, 6, 8, 12] {
        let tree = RegionTree::build(banded_disparity(8, 24, layers), layers, 3).unwrap();
        let leaves = tree.nodes().iter().filter(|n| n.is_leaf()).count();
        assert_eq!(leaves, layers);
        for id in 0..layers {
            let node = tree.node(id).unwrap();
            assert!(node.is_leaf());
            assert_eq!(node.layers, id as u8..id as u8 + 1);
        }
    }
}

#[test]
fn test_nodes_have_zero_or_two_children() {
    let tree = RegionTree::build(banded_disparity(8, 24, 12), 12, 1).unwrap();
    for node in tree.nodes() {
        if let Some((a, b)) = node.children {
            assert_eq!(tree.node(a).unwrap().parent, Some(node.id));
            assert_eq!(tree.node(b).unwrap().parent, Some(node.id));
            assert_eq!(tree.node(a).unwrap().layers.end, tree.node(b).unwrap().layers.start);
        }
    }
    assert_eq!(tree.top_level_ids().len(), 1);
}

#[test]
fn test_top_level_bound_is_respected() {
    for max_top in 1..=6 {
        let tree = RegionTree::build(banded_disparity(8, 24, 12), 12, max_top).unwrap();
        assert!(tree.top_level_ids().len() <= max_top);
    }
}

// ---------------------------------------------------------------------------
// Neighbours and masks
// ---------------------------------------------------------------------------

#[test]
fn test_siblings_and_level_peers() {
    let tree = RegionTree::build(banded_disparity(4, 4, 4), 4, 1).unwrap();
    assert_eq!(tree.sibling(0).unwrap(), Some(1));
    assert_eq!(tree.sibling(3).unwrap(), Some(2));
    assert_eq!(tree.sibling(6).unwrap(), None);
    assert_eq!(tree.level_peers(2).unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(tree.level_peers(5).unwrap(), vec![4, 5]);
}

#[test]
fn test_masks_follow_layer_ranges() {
    let tree = RegionTree::build(banded_disparity(4, 4, 4), 4, 1).unwrap();
    let mask = tree.mask(5, View::Right).unwrap();
    assert!(!mask[[0, 1]]);
    assert!(mask[[0, 2]] && mask[[0, 3]]);
}

#[test]
fn test_leaf_masks_partition_each_view() {
    let tree = RegionTree::build(banded_disparity(16, 32, 4), 4, 2).unwrap();
    for view in View::BOTH {
        let mut coverage = Array2::<u32>::zeros((16, 32));
        for id in 0..tree.layers() {
            let mask = tree.mask(id, view).unwrap();
            coverage.zip_mut_with(&mask, |c, &m| *c += m as u32);
        }
        assert!(coverage.iter().all(|&c| c == 1));
    }
}

#[test]
fn test_top_level_masks_partition_each_view() {
    let tree = RegionTree::build(banded_disparity(16, 32, 8), 8, 3).unwrap();
    let mut coverage = Array2::<u32>::zeros((16, 32));
    for &id in tree.top_level_ids() {
        let mask = tree.mask(id, View::Left).unwrap();
        coverage.zip_mut_with(&mask, |c, &m| *c += m as u32);
    }
    assert!(coverage.iter().all(|&c| c == 1));
}

#[test]
fn test_unknown_node_is_an_error() {
    let tree = RegionTree::build(banded_disparity(4, 4, 2), 2, 1).unwrap();
    assert!(matches!(tree.node(99), Err(DeblurError::UnknownNode(99))));
    assert!(tree.mask(99, View::Left).is_err());
}
