use crate::grid::{Grid, Voxel, NUM_LEVELS};

impl Grid {
    /// Counts the leaves reachable from the root.
    ///
    /// This is mostly a utility for debugging.
    pub fn reachable_leaf_count(&self) -> usize {
        self.reachable_leaf_count_recurse(0, 0)
    }

    fn reachable_leaf_count_recurse(&self, level: usize, node: usize) -> usize {
        let nv = self.layout.num_voxels(level);
        self.levels[level].voxels[node * nv..(node + 1) * nv]
            .iter()
            .map(|voxel| match voxel {
                Voxel::Empty => 0,
                Voxel::Tile(_) | Voxel::LeafPointer { .. } => 1,
                Voxel::ChildPointer(child) => {
                    self.reachable_leaf_count_recurse(level + 1, *child as usize)
                }
            })
            .sum()
    }

    /// Panics if the grid isn’t well-formed.
    ///
    /// The grid is well-formed if it is topologically correct (every node in use is
    /// referenced by exactly one child pointer, and every leaf exactly once) and its value
    /// ranges are consistent (the range of a voxel encloses the ranges of every voxel of its
    /// child node).
    pub fn assert_well_formed(&self) {
        assert_eq!(self.levels[0].num_nodes, 1);
        assert_eq!(self.levels[NUM_LEVELS - 1].num_nodes, 0);

        let mut node_seen: [Vec<bool>; NUM_LEVELS] =
            core::array::from_fn(|l| vec![false; self.levels[l].num_nodes]);
        let mut leaf_seen = vec![false; self.total_num_leaves];
        node_seen[0][0] = true;

        self.assert_well_formed_recurse(0, 0, &mut node_seen, &mut leaf_seen);

        for (l, seen) in node_seen.iter().enumerate() {
            assert!(
                seen.iter().all(|s| *s),
                "unreachable node on level {}",
                l
            );
        }
        assert!(leaf_seen.iter().all(|s| *s), "unreachable leaf");
    }

    fn assert_well_formed_recurse(
        &self,
        level: usize,
        node: usize,
        node_seen: &mut [Vec<bool>; NUM_LEVELS],
        leaf_seen: &mut [bool],
    ) {
        let nv = self.layout.num_voxels(level);
        let lvl = &self.levels[level];

        for v in node * nv..(node + 1) * nv {
            let range = lvl.value_range[v];

            match lvl.voxels[v] {
                Voxel::Empty => {}
                Voxel::Tile(value) => {
                    assert!(range.contains(value));
                    Self::mark_leaf(leaf_seen, lvl.leaf_index[v] as usize);
                }
                Voxel::LeafPointer { data, .. } => {
                    assert_eq!(data, lvl.leaf_index[v]);
                    Self::mark_leaf(leaf_seen, data as usize);
                }
                Voxel::ChildPointer(child) => {
                    let child = child as usize;
                    assert!(level + 1 < NUM_LEVELS - 1);
                    assert!(child < self.levels[level + 1].num_nodes);
                    assert!(
                        !node_seen[level + 1][child],
                        "node {} of level {} referenced twice",
                        child,
                        level + 1
                    );
                    node_seen[level + 1][child] = true;

                    let cnv = self.layout.num_voxels(level + 1);
                    let child_level = &self.levels[level + 1];
                    for cv in child * cnv..(child + 1) * cnv {
                        if !child_level.voxels[cv].is_empty() {
                            let child_range = child_level.value_range[cv];
                            assert!(child_range.lower >= range.lower);
                            assert!(child_range.upper <= range.upper);
                        }
                    }

                    self.assert_well_formed_recurse(level + 1, child, node_seen, leaf_seen);
                }
            }
        }
    }

    fn mark_leaf(leaf_seen: &mut [bool], leaf: usize) {
        assert!(!leaf_seen[leaf], "leaf {} inserted twice", leaf);
        leaf_seen[leaf] = true;
    }
}
