use crate::bounding_volume::IndexBox;
use crate::grid::{Grid, LeafFormat, LeafHandle, Voxel, NUM_LEVELS};
use crate::math::{IndexPoint, Offset, Point, Real, Vector};
use crate::utils::ValueRange;

/// The reconstruction filter used to sample a grid between lattice points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum Filter {
    /// The value of the cell containing the sample point.
    Nearest,
    /// Trilinear interpolation of the eight lattice points surrounding the sample point.
    #[default]
    Trilinear,
}

impl Grid {
    /// The value of the index-space cell `cell`.
    ///
    /// Walks the tree from the root down to the leaf containing the cell, stopping at
    /// [`Grid::max_sampling_depth`]: past that depth the midpoint of the value range of the
    /// voxel is returned. Cells outside of every leaf have the background value.
    pub fn value_at(&self, cell: &IndexPoint) -> Real {
        let Some(offset) = self.offset_of(cell) else {
            return self.background;
        };

        let mut node = 0;
        for l in 0..NUM_LEVELS - 1 {
            let level = &self.levels[l];
            let v = self.voxel_index(node, &offset, l);

            match level.voxels[v] {
                Voxel::Empty => return self.background,
                Voxel::Tile(value) => return value,
                Voxel::LeafPointer { data, format } => {
                    let Some(values) = self.leaf_data(data) else {
                        return self.background;
                    };
                    return match format {
                        LeafFormat::Tile => values.first().copied().unwrap_or(self.background),
                        LeafFormat::Dense if l >= self.max_sampling_depth => {
                            level.value_range[v].midpoint()
                        }
                        LeafFormat::Dense => {
                            let i = self.layout.linear_voxel_index(&offset, l + 1);
                            values.get(i).copied().unwrap_or(self.background)
                        }
                    };
                }
                Voxel::ChildPointer(_) if l >= self.max_sampling_depth => {
                    return level.value_range[v].midpoint();
                }
                Voxel::ChildPointer(child) => node = child as usize,
            }
        }

        self.background
    }

    /// Samples the grid at the index-space point `pt`.
    pub fn sample_index(&self, pt: &Point<Real>, filter: Filter) -> Real {
        let base = pt.map(|x| x.floor());
        let cell = base.map(|x| x as i32);

        match filter {
            Filter::Nearest => self.value_at(&cell),
            Filter::Trilinear => {
                let frac = pt - base;
                let mut result = 0.0;

                for corner in 0..8 {
                    let d = [(corner >> 2) & 1, (corner >> 1) & 1, corner & 1];
                    let mut weight = 1.0;
                    for i in 0..3 {
                        weight *= if d[i] == 1 { frac[i] } else { 1.0 - frac[i] };
                    }

                    if weight != 0.0 {
                        let neighbor = IndexPoint::new(
                            cell.x.saturating_add(d[0]),
                            cell.y.saturating_add(d[1]),
                            cell.z.saturating_add(d[2]),
                        );
                        result += weight * self.value_at(&neighbor);
                    }
                }

                result
            }
        }
    }

    /// The gradient of the sampled field at the index-space point `pt`, in index space.
    ///
    /// Computed with central differences of one index unit.
    pub fn gradient_index(&self, pt: &Point<Real>, filter: Filter) -> Vector<Real> {
        Vector::from_fn(|i, _| {
            let mut step = Vector::zeros();
            step[i] = 1.0;
            (self.sample_index(&(pt + step), filter) - self.sample_index(&(pt - step), filter))
                * 0.5
        })
    }

    /// Bounds on [`Grid::value_at`] over every cell of `cells`.
    ///
    /// The result contains the background as soon as one of the cells is outside of every
    /// leaf, and is empty only if `cells` is.
    pub fn value_range_in(&self, cells: &IndexBox) -> ValueRange {
        let mut result = ValueRange::empty();
        if cells.is_empty() {
            return result;
        }

        let res = self.layout.level_res(0) as i64;
        let mut lower = [0u32; 3];
        let mut upper = [0u32; 3];

        for i in 0..3 {
            let root = self.root_origin[i] as i64;
            let lo = cells.lower[i] as i64 - root;
            let hi = cells.upper[i] as i64 - root;

            if lo < 0 || hi > res {
                result.extend(self.background);
            }
            if hi <= 0 || lo >= res {
                return result;
            }

            lower[i] = lo.max(0) as u32;
            upper[i] = hi.min(res) as u32;
        }

        self.node_range_in(0, 0, Offset::origin(), &lower, &upper, &mut result);
        result
    }

    // `lower..upper` are root offsets overlapping the node at `origin`.
    fn node_range_in(
        &self,
        level: usize,
        node: usize,
        origin: Offset,
        lower: &[u32; 3],
        upper: &[u32; 3],
        result: &mut ValueRange,
    ) {
        let res = self.layout.voxel_res(level);
        let node_res = self.layout.level_res(level);
        let mut first = [0u32; 3];
        let mut last = [0u32; 3];

        for i in 0..3 {
            first[i] = (lower[i].max(origin[i]) - origin[i]) / res;
            last[i] = (upper[i].min(origin[i] + node_res) - 1 - origin[i]) / res;
        }

        for x in first[0]..=last[0] {
            for y in first[1]..=last[1] {
                for z in first[2]..=last[2] {
                    let v = node * self.layout.num_voxels(level)
                        + self.layout.linearize(x, y, z, level);
                    let lvl = &self.levels[level];

                    match lvl.voxels[v] {
                        Voxel::Empty => result.extend(self.background),
                        Voxel::Tile(value) => result.extend(value),
                        Voxel::ChildPointer(child)
                            if level < self.max_sampling_depth && level + 2 < NUM_LEVELS =>
                        {
                            let child_origin = Offset::new(
                                origin.x + x * res,
                                origin.y + y * res,
                                origin.z + z * res,
                            );
                            self.node_range_in(
                                level + 1,
                                child as usize,
                                child_origin,
                                lower,
                                upper,
                                result,
                            );
                        }
                        Voxel::LeafPointer {
                            data,
                            format: LeafFormat::Dense,
                        } if level < self.max_sampling_depth => {
                            let leaf_origin = Offset::new(
                                origin.x + x * res,
                                origin.y + y * res,
                                origin.z + z * res,
                            );
                            self.leaf_range_in(data, level + 1, leaf_origin, lower, upper, result);
                        }
                        // Tiles, and nodes past the sampling depth, are sampled within the
                        // range of their voxel.
                        Voxel::ChildPointer(_) | Voxel::LeafPointer { .. } => {
                            result.extend_range(&lvl.value_range[v])
                        }
                    }
                }
            }
        }
    }

    fn leaf_range_in(
        &self,
        data: LeafHandle,
        level: usize,
        origin: Offset,
        lower: &[u32; 3],
        upper: &[u32; 3],
        result: &mut ValueRange,
    ) {
        let Some(values) = self.leaf_data(data) else {
            result.extend(self.background);
            return;
        };
        let res = self.layout.level_res(level);
        let range = |i: usize| lower[i].max(origin[i])..upper[i].min(origin[i] + res);

        for x in range(0) {
            for y in range(1) {
                for z in range(2) {
                    let i = self.layout.linear_voxel_index(&Offset::new(x, y, z), level);
                    result.extend(values.get(i).copied().unwrap_or(self.background));
                }
            }
        }
    }
}
