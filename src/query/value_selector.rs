use crate::math::Real;
use crate::utils::ValueRange;
use smallvec::SmallVec;

/// The values of interest of a traversal.
///
/// The interval iterator only reports intervals whose value range overlaps one of the
/// [`Self::ranges`]; the hit iterator looks for crossings of the [`Self::values`].
/// An empty set of ranges selects everything.
///
/// # Example
///
/// ```
/// use vdbtrace::query::ValueSelector;
/// use vdbtrace::utils::ValueRange;
///
/// let selector = ValueSelector::from_ranges([ValueRange::new(0.0, 1.0)]);
/// assert!(selector.overlaps(&ValueRange::new(0.5, 3.0)));
/// assert!(!selector.overlaps(&ValueRange::new(2.0, 3.0)));
///
/// let isovalues = ValueSelector::from_values([0.5, -1.0, 0.5]);
/// assert_eq!(isovalues.values(), &[-1.0, 0.5]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ValueSelector {
    ranges: SmallVec<[ValueRange; 4]>,
    values: SmallVec<[Real; 4]>,
}

impl ValueSelector {
    /// A selector that selects every range and holds no value.
    pub fn new() -> Self {
        Self::default()
    }

    /// A selector for the given value ranges. Empty ranges are ignored.
    pub fn from_ranges(ranges: impl IntoIterator<Item = ValueRange>) -> Self {
        Self::new().with_ranges(ranges)
    }

    /// A selector for the given values. NaNs are ignored.
    pub fn from_values(values: impl IntoIterator<Item = Real>) -> Self {
        Self::new().with_values(values)
    }

    /// Adds value ranges to this selector. Empty ranges are ignored.
    pub fn with_ranges(mut self, ranges: impl IntoIterator<Item = ValueRange>) -> Self {
        self.ranges
            .extend(ranges.into_iter().filter(|range| !range.is_empty()));
        self
    }

    /// Adds values to this selector. NaNs are ignored.
    ///
    /// Values are kept sorted and without duplicates.
    pub fn with_values(mut self, values: impl IntoIterator<Item = Real>) -> Self {
        self.values
            .extend(values.into_iter().filter(|value| !value.is_nan()));
        self.values.sort_unstable_by(|a, b| a.total_cmp(b));
        self.values.dedup();
        self
    }

    /// The selected value ranges.
    #[inline]
    pub fn ranges(&self) -> &[ValueRange] {
        &self.ranges
    }

    /// The selected values, sorted in increasing order.
    #[inline]
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    /// Does `range` overlap any selected range?
    ///
    /// Always true if this selector has no range.
    pub fn overlaps(&self, range: &ValueRange) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|r| r.overlaps(range))
    }

    /// Does `range` contain any selected value?
    pub fn contains_any_value(&self, range: &ValueRange) -> bool {
        self.values.iter().any(|v| range.contains(*v))
    }
}
