use crate::common::{layout, Leaves};
use vdbtrace::grid::{DataBuffer, DataType, Filter};
use vdbtrace::math::{Point, Vector};
use vdbtrace::query::{Ray, ValueSelector};
use vdbtrace::utils::ValueRange;
use vdbtrace::volume::{VdbParams, VdbVolume};
use vdbtrace::VdbError;

const SCALE_AND_SHIFT: [f32; 12] = [
    2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 10.0, 0.0, 0.0,
];

fn ramp() -> Leaves {
    let mut leaves = Leaves::default();
    leaves.dense(3, [0, 0, 0], (0..64).map(|i| (i >> 4) as f32).collect());
    leaves
}

#[test]
fn everything_needs_a_commit() {
    let volume = VdbVolume::new(ramp().params());
    let ray = Ray::new(Point::origin(), Vector::x());
    let t_range = ValueRange::new(0.0, 1.0);
    let selector = ValueSelector::from_values([0.5]);

    assert!(!volume.is_committed());
    assert_eq!(volume.grid().unwrap_err(), VdbError::NotCommitted);
    assert_eq!(volume.bounds().unwrap_err(), VdbError::NotCommitted);
    assert_eq!(volume.value_range().unwrap_err(), VdbError::NotCommitted);
    assert_eq!(volume.sample(&Point::origin()).unwrap_err(), VdbError::NotCommitted);
    assert_eq!(volume.gradient(&Point::origin()).unwrap_err(), VdbError::NotCommitted);
    assert!(matches!(
        volume.interval_iterator(&ray, t_range, None),
        Err(VdbError::NotCommitted)
    ));
    assert!(matches!(
        volume.hit_iterator(&ray, t_range, &selector),
        Err(VdbError::NotCommitted)
    ));
}

#[test]
fn missing_parameters() {
    let mut params = ramp().params();
    params.data = None;
    let mut volume = VdbVolume::new(params);
    assert_eq!(volume.commit(), Err(VdbError::MissingParameter("data")));

    volume.params_mut().data = ramp().params().data;
    volume.params_mut().origin = None;
    assert_eq!(volume.commit(), Err(VdbError::MissingParameter("origin")));
}

#[test]
fn unsupported_data() {
    let mut volume = VdbVolume::new(ramp().params());
    volume.params_mut().data_type = DataType::Double;
    assert_eq!(volume.commit(), Err(VdbError::UnsupportedDataType("double")));

    volume.params_mut().data_type = DataType::Float;
    volume.params_mut().data = Some(vec![DataBuffer::UInt(vec![0u32; 64].into())]);
    assert_eq!(volume.commit(), Err(VdbError::UnsupportedDataType("uint")));
}

#[test]
fn failed_commit_drops_the_grid() {
    let mut volume = VdbVolume::new(ramp().params());
    volume.commit().unwrap();
    assert!(volume.is_committed());

    volume.params_mut().format = Some(vec![7]);
    assert_eq!(
        volume.commit(),
        Err(VdbError::UnsupportedLeafFormat { leaf: 0, format: 7 })
    );
    assert_eq!(volume.grid().unwrap_err(), VdbError::NotCommitted);

    volume.params_mut().format = Some(vec![1]);
    assert!(volume.commit().is_ok());
}

#[test]
fn singular_transform() {
    let mut volume = VdbVolume::new(VdbParams {
        index_to_object: Some(vec![0.0; 12]),
        ..ramp().params()
    });
    assert_eq!(volume.commit(), Err(VdbError::NonInvertibleTransform));
}

#[test]
fn depths_are_clamped() {
    let mut volume = VdbVolume::new(VdbParams {
        max_sampling_depth: -2,
        max_iterator_depth: 9,
        ..ramp().params()
    });
    volume.commit().unwrap();
    let grid = volume.grid().unwrap();
    assert_eq!(grid.max_sampling_depth(), 0);
    assert_eq!(grid.max_iterator_depth(), 3);
}

#[test]
fn object_space_queries() {
    let mut volume = VdbVolume::new(VdbParams {
        index_to_object: Some(SCALE_AND_SHIFT.to_vec()),
        ..ramp().params()
    });
    volume.commit().unwrap();

    let bounds = volume.bounds().unwrap();
    assert_eq!(bounds.mins, Point::new(10.0, 0.0, 0.0));
    assert_eq!(bounds.maxs, Point::new(18.0, 8.0, 8.0));
    assert_eq!(volume.value_range().unwrap(), ValueRange::new(0.0, 3.0));

    // Index point (1.5, 1.5, 1.5).
    let pt = Point::new(13.0, 3.0, 3.0);
    approx::assert_relative_eq!(volume.sample(&pt).unwrap(), 1.5);
    approx::assert_relative_eq!(volume.gradient(&pt).unwrap(), Vector::new(0.5, 0.0, 0.0));

    let ray = Ray::new(Point::new(0.0, 3.0, 3.0), Vector::x());
    let t_range = ValueRange::new(0.0, 100.0);
    let intervals: Vec<_> = volume.interval_iterator(&ray, t_range, None).unwrap().collect();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].t_range, ValueRange::new(10.0, 18.0));
    assert_eq!(intervals[0].nominal_delta_t, 2.0);

    let isovalues = ValueSelector::from_values([1.5]);
    let hit = volume
        .hit_iterator(&ray, t_range, &isovalues)
        .unwrap()
        .next()
        .unwrap();
    approx::assert_relative_eq!(hit.t, 13.0, epsilon = 1.0e-3);
}

#[test]
fn nearest_filter() {
    let mut volume = VdbVolume::new(VdbParams {
        filter: Filter::Nearest,
        ..ramp().params()
    });
    volume.commit().unwrap();
    assert_eq!(volume.sample(&Point::new(1.9, 0.5, 0.5)).unwrap(), 1.0);
}

#[test]
fn recommit_with_another_layout() {
    let mut volume = VdbVolume::new(ramp().params());
    volume.commit().unwrap();
    assert_eq!(volume.grid().unwrap().layout(), &layout());

    // The default layout has 8x8x8 leaves on the last level.
    volume.params_mut().layout = Default::default();
    assert_eq!(
        volume.commit(),
        Err(VdbError::LeafDataSize {
            leaf: 0,
            expected: 512,
            found: 64
        })
    );
}
