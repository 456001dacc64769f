use crate::common::{random_leaves, Leaves};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use vdbtrace::grid::{Grid, Voxel, NUM_LEVELS};
use vdbtrace::math::IndexPoint;
use vdbtrace::utils::ValueRange;
use vdbtrace::VdbError;

#[test]
fn single_tile_below_a_level_one_node() {
    let mut leaves = Leaves::default();
    leaves.tile(2, [0, 0, 0], 0.5);
    let grid = leaves.build().unwrap();

    assert_eq!(grid.level(0).voxel(0), Voxel::child_pointer(0));
    assert_eq!(grid.level(1).num_nodes(), 1);
    assert_eq!(grid.level(1).voxel(0), Voxel::tile(0.5));
    assert_eq!(grid.value_range(), ValueRange::splat(0.5));
    assert_eq!(grid.total_num_leaves(), 1);
    grid.assert_well_formed();
}

#[test]
fn siblings_share_one_parent() {
    let mut leaves = Leaves::default();
    leaves.tile(3, [0, 0, 0], 1.0);
    leaves.tile(3, [4, 4, 0], 2.0);
    let grid = leaves.build().unwrap();

    assert_eq!(grid.level(1).num_nodes(), 1);
    assert_eq!(grid.level(2).num_nodes(), 1);
    assert_eq!(grid.num_leaves(3), 2);
    assert_eq!(grid.reachable_leaf_count(), 2);
    grid.assert_well_formed();
}

#[test]
fn random_grids_are_well_formed() {
    let mut rng = oorandom::Rand32::new(42);

    for offset in [[0, 0, 0], [-64, 128, 64], [192, -192, 0]] {
        let leaves = random_leaves(&mut rng, offset);
        let grid = leaves.build().unwrap();

        grid.assert_well_formed();
        assert_eq!(grid.total_num_leaves(), leaves.len());
        assert_eq!(grid.reachable_leaf_count(), leaves.len());
        assert_eq!(grid.value_range(), leaves.value_range());
    }
}

#[test]
fn root_voxel_ranges_enclose_their_subtrees() {
    let mut rng = oorandom::Rand32::new(7);
    let leaves = random_leaves(&mut rng, [0, 0, 0]);
    let grid = leaves.build().unwrap();
    let root = grid.level(0);

    for v in 0..grid.layout().num_voxels(0) {
        let range = root.value_range(v);
        if !root.voxel(v).is_empty() {
            assert!(range.lower >= grid.value_range().lower);
            assert!(range.upper <= grid.value_range().upper);
        }
    }
}

/// Compares two grids built from permutations of the same leaves.
///
/// Leaf `i` of `b` is leaf `permutation[i]` of `a`.
fn assert_same_up_to_relabeling(a: &Grid, b: &Grid, permutation: &[usize]) {
    for l in 0..NUM_LEVELS {
        let (la, lb) = (a.level(l), b.level(l));
        assert_eq!(la.num_nodes(), lb.num_nodes(), "level {}", l);

        for v in 0..la.num_nodes() * a.layout().num_voxels(l) {
            let vb = match lb.voxel(v) {
                Voxel::LeafPointer { data, format } => {
                    Voxel::leaf_pointer(permutation[data as usize] as u32, format)
                }
                voxel => voxel,
            };
            assert_eq!(la.voxel(v), vb);
            assert_eq!(la.value_range(v), lb.value_range(v));
            assert_eq!(
                la.leaf_index(v),
                lb.leaf_index(v).map(|i| permutation[i as usize] as u32)
            );
        }
    }
}

#[test]
fn node_numbering_does_not_depend_on_the_input_order() {
    let mut rng = oorandom::Rand32::new(1234);
    let leaves = random_leaves(&mut rng, [0, 64, 0]);
    let grid = leaves.build().unwrap();

    let mut shuffle = rand::rngs::StdRng::seed_from_u64(5);
    for _ in 0..3 {
        let mut permutation: Vec<usize> = (0..leaves.len()).collect();
        permutation.shuffle(&mut shuffle);
        let shuffled = leaves.permuted(&permutation).build().unwrap();
        assert_same_up_to_relabeling(&grid, &shuffled, &permutation);
    }
}

#[test]
fn mixed_levels() {
    let mut leaves = Leaves::default();
    leaves.tile(1, [64, 0, 0], -1.0);
    leaves.tile(2, [0, 16, 0], 2.0);
    leaves.dense(3, [0, 0, 4], (0..64).map(|i| i as f32).collect());
    let grid = leaves.build().unwrap();

    assert_eq!(grid.root_origin(), IndexPoint::origin());
    assert_eq!(grid.level(0).voxel(16), Voxel::tile(-1.0));
    assert_eq!(grid.level(1).num_nodes(), 1);
    assert_eq!(grid.level(2).num_nodes(), 1);
    assert_eq!(grid.value_range(), ValueRange::new(-1.0, 63.0));
    assert_eq!(grid.level(0).value_range(0), ValueRange::new(0.0, 63.0));
    grid.assert_well_formed();
}

#[test]
fn leaves_spanning_more_than_the_root() {
    let mut leaves = Leaves::default();
    leaves.tile(3, [0, 0, 0], 0.0);
    leaves.tile(3, [252, 0, 0], 0.0);
    assert!(leaves.build().is_ok());

    leaves.tile(3, [256, 0, 0], 0.0);
    assert_eq!(leaves.build().unwrap_err(), VdbError::LeavesDoNotFit);
}

#[test]
fn overlapping_leaves() {
    let mut leaves = Leaves::default();
    leaves.tile(1, [0, 0, 0], 0.0);
    leaves.dense(3, [8, 8, 8], vec![0.0; 64]);
    assert!(matches!(
        leaves.build(),
        Err(VdbError::LeafCollision { level: 0, .. })
    ));
}

#[test]
fn allocated_bytes_grow_with_nodes() {
    let mut small = Leaves::default();
    small.tile(1, [0, 0, 0], 0.0);
    let mut large = small.clone();
    large.tile(3, [64, 0, 0], 0.0);

    let small = small.build().unwrap();
    let large = large.build().unwrap();
    assert!(large.bytes_allocated() > small.bytes_allocated());
}
