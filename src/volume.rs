//! Volumes: parameters, commit, and access to the committed grid.

use crate::bounding_volume::Aabb;
use crate::error::VdbError;
use crate::grid::{DataBuffer, DataType, Filter, Grid, GridBuilder, GridLayout, NUM_LEVELS};
use crate::grid::DEFAULT_ITERATOR_EPSILON;
use crate::math::{AffineTransform, Point, Real, Vector};
use crate::observer::{LeafAccessObserver, LEAF_NODE_ACCESS};
use crate::query::{HitIterator, IntervalIterator, Ray, ValueSelector};
use crate::utils::ValueRange;

/// The parameters a volume is committed from.
///
/// The leaf arrays `level`, `origin`, `format` and `data` are required and must all have
/// the same length: entry `i` of each describes leaf `i`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(Serialize, Deserialize),
    serde(default)
)]
pub struct VdbParams {
    /// The element type of the leaf data. Only [`DataType::Float`] is supported.
    pub data_type: DataType,
    /// The reconstruction filter used for sampling.
    pub filter: Filter,
    /// The deepest level the sampler descends to, clamped to `0..NUM_LEVELS`.
    pub max_sampling_depth: i32,
    /// The deepest level interval iterators descend to, clamped to `0..NUM_LEVELS`.
    pub max_iterator_depth: i32,
    /// The 12 floats of the index-to-object transform, see [`AffineTransform::from_slice`].
    pub index_to_object: Option<Vec<Real>>,
    /// The level of each leaf.
    pub level: Option<Vec<u32>>,
    /// The index-space lower corner of each leaf.
    pub origin: Option<Vec<[i32; 3]>>,
    /// The format of each leaf: `0` for a tile, `1` for dense values.
    pub format: Option<Vec<u32>>,
    /// The payload of each leaf.
    pub data: Option<Vec<DataBuffer>>,
    /// The branching factors of the grid.
    pub layout: GridLayout,
    /// The minimum parametric step of interval iterators.
    pub iterator_epsilon: Real,
    /// The value sampled outside of every leaf.
    pub background: Real,
}

impl Default for VdbParams {
    fn default() -> Self {
        Self {
            data_type: DataType::Float,
            filter: Filter::default(),
            max_sampling_depth: NUM_LEVELS as i32 - 1,
            max_iterator_depth: NUM_LEVELS as i32 - 1,
            index_to_object: None,
            level: None,
            origin: None,
            format: None,
            data: None,
            layout: GridLayout::default(),
            iterator_epsilon: DEFAULT_ITERATOR_EPSILON,
            background: 0.0,
        }
    }
}

fn clamp_depth(name: &str, depth: i32) -> usize {
    let clamped = depth.clamp(0, NUM_LEVELS as i32 - 1);
    if clamped != depth {
        log::warn!("{} = {} is out of range, clamped to {}", name, depth, clamped);
    }
    clamped as usize
}

/// A volume backed by a sparse grid.
///
/// Parameters are set first, then [`VdbVolume::commit`] builds the grid. Everything else
/// needs a successful commit and reports [`VdbError::NotCommitted`] otherwise. Iterators
/// and observers borrow the volume, so it cannot be recommitted while they are alive.
#[derive(Debug, Default)]
pub struct VdbVolume {
    params: VdbParams,
    filter: Filter,
    grid: Option<Grid>,
}

impl VdbVolume {
    /// A volume with the given parameters. Call [`Self::commit`] to build it.
    pub fn new(params: VdbParams) -> Self {
        Self {
            params,
            filter: Filter::default(),
            grid: None,
        }
    }

    /// The parameters of the next commit.
    #[inline]
    pub fn params(&self) -> &VdbParams {
        &self.params
    }

    /// The parameters of the next commit, for modification.
    ///
    /// Modifications only take effect on the next commit.
    #[inline]
    pub fn params_mut(&mut self) -> &mut VdbParams {
        &mut self.params
    }

    /// Was the last commit successful?
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.grid.is_some()
    }

    /// Builds the grid from the current parameters.
    ///
    /// The previous grid is dropped first: if the commit fails, the volume has no grid.
    pub fn commit(&mut self) -> Result<(), VdbError> {
        self.grid = None;

        let params = &self.params;
        let level = params
            .level
            .as_deref()
            .ok_or(VdbError::MissingParameter("level"))?;
        let origin = params
            .origin
            .as_deref()
            .ok_or(VdbError::MissingParameter("origin"))?;
        let format = params
            .format
            .as_deref()
            .ok_or(VdbError::MissingParameter("format"))?;
        let data = params
            .data
            .as_deref()
            .ok_or(VdbError::MissingParameter("data"))?;

        params.data_type.ensure_supported()?;

        let index_to_object = params
            .index_to_object
            .as_deref()
            .map(AffineTransform::from_slice)
            .unwrap_or_default();

        let grid = GridBuilder::new(params.layout)
            .index_to_object(index_to_object)
            .max_sampling_depth(clamp_depth("max_sampling_depth", params.max_sampling_depth))
            .max_iterator_depth(clamp_depth("max_iterator_depth", params.max_iterator_depth))
            .iterator_epsilon(params.iterator_epsilon)
            .background(params.background)
            .build(level, origin, format, data)?;

        self.filter = params.filter;
        self.grid = Some(grid);
        Ok(())
    }

    /// The committed grid.
    #[inline]
    pub fn grid(&self) -> Result<&Grid, VdbError> {
        self.grid.as_ref().ok_or(VdbError::NotCommitted)
    }

    /// The object-space bounding box of the volume.
    pub fn bounds(&self) -> Result<Aabb, VdbError> {
        Ok(*self.grid()?.bounds())
    }

    /// The range of all the values of the volume.
    pub fn value_range(&self) -> Result<ValueRange, VdbError> {
        Ok(self.grid()?.value_range())
    }

    /// Samples the volume at the object-space point `pt`.
    pub fn sample(&self, pt: &Point<Real>) -> Result<Real, VdbError> {
        let grid = self.grid()?;
        let local = grid.object_to_index().transform_point(pt);
        Ok(grid.sample_index(&local, self.filter))
    }

    /// The object-space gradient of the volume at the object-space point `pt`.
    pub fn gradient(&self, pt: &Point<Real>) -> Result<Vector<Real>, VdbError> {
        let grid = self.grid()?;
        let to_index = grid.object_to_index();
        let local = to_index.transform_point(pt);
        let gradient = grid.gradient_index(&local, self.filter);
        Ok(to_index.linear.transpose() * gradient)
    }

    /// An iterator over the intervals of the volume crossed by `ray`.
    pub fn interval_iterator<'a>(
        &'a self,
        ray: &Ray,
        t_range: ValueRange,
        selector: Option<&'a ValueSelector>,
    ) -> Result<IntervalIterator<'a>, VdbError> {
        Ok(IntervalIterator::new(self.grid()?, ray, t_range, selector))
    }

    /// An iterator over the crossings of `selector`'s values by `ray`.
    pub fn hit_iterator<'a>(
        &'a self,
        ray: &Ray,
        t_range: ValueRange,
        selector: &'a ValueSelector,
    ) -> Result<HitIterator<'a>, VdbError> {
        Ok(HitIterator::new(self.grid()?, ray, t_range, selector).with_filter(self.filter))
    }

    /// Creates an observer of the given type.
    ///
    /// The only supported type is [`LEAF_NODE_ACCESS`].
    pub fn new_observer(&self, kind: &str) -> Result<LeafAccessObserver<'_>, VdbError> {
        if kind != LEAF_NODE_ACCESS {
            return Err(VdbError::UnsupportedObserver(kind.to_string()));
        }

        Ok(LeafAccessObserver::new(self.grid()?))
    }
}
