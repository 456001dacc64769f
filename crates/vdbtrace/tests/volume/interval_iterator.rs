use crate::common::{random_leaves, Leaves};
use vdbtrace::bounding_volume::Aabb;
use vdbtrace::grid::{Filter, GridBuilder, GridLayout};
use vdbtrace::math::{Point, Real, Vector};
use vdbtrace::query::{IntervalIterator, IteratorState, Ray, ValueSelector};
use vdbtrace::utils::ValueRange;

fn random_ray(rng: &mut oorandom::Rand32, center: Point<Real>) -> Ray {
    let dir = Vector::from_fn(|_, _| rng.rand_float() * 2.0 - 1.0);
    let origin = center - dir.normalize() * 100.0;
    Ray::new(origin, dir)
}

/// 64 level 2 tiles filling the cube [0, 64)^3.
fn filled_cube() -> Leaves {
    let mut leaves = Leaves::default();
    for slot in 0..64 {
        let origin = [(slot >> 4) * 16, ((slot >> 2) & 3) * 16, (slot & 3) * 16];
        leaves.tile(2, origin, slot as f32);
    }
    leaves
}

#[test]
fn intervals_tile_a_filled_region() {
    let grid = filled_cube().build().unwrap();
    let bounds = Aabb::new(Point::origin(), Point::new(64.0, 64.0, 64.0));
    let mut rng = oorandom::Rand32::new(3);

    for _ in 0..100 {
        let ray = random_ray(&mut rng, Point::new(32.0, 32.0, 32.0));
        let Some((t0, t1)) = bounds.clip_line_parameters(&ray.origin, &ray.dir) else {
            continue;
        };

        let intervals: Vec<_> =
            IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, Real::MAX), None).collect();

        assert!(!intervals.is_empty());
        approx::assert_relative_eq!(intervals[0].t_range.lower, t0, epsilon = 1.0e-4);
        approx::assert_relative_eq!(
            intervals[intervals.len() - 1].t_range.upper,
            t1,
            epsilon = 1.0e-4
        );
        for w in intervals.windows(2) {
            assert_eq!(w[0].t_range.upper, w[1].t_range.lower);
        }
    }
}

#[test]
fn intervals_are_ordered_and_bound_the_values() {
    let mut rng = oorandom::Rand32::new(99);
    let leaves = random_leaves(&mut rng, [0, 0, 0]);
    let grid = leaves.build().unwrap();

    for _ in 0..200 {
        let ray = random_ray(&mut rng, Point::new(32.0, 32.0, 32.0));
        let mut prev_upper = Real::NEG_INFINITY;

        for interval in IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, Real::MAX), None)
        {
            let t = interval.t_range;
            assert!(t.lower < t.upper);
            assert!(prev_upper <= t.lower);
            prev_upper = t.upper;

            let pt = ray.point_at(t.midpoint());
            // Stay away from cell faces, where rounding may pick the neighbor cell.
            if pt.iter().all(|c| (c - c.round()).abs() > 1.0e-3) {
                let value = grid.sample_index(&pt, Filter::Nearest);
                assert!(
                    interval.value_range.contains(value),
                    "{} not in {:?}",
                    value,
                    interval.value_range
                );
            }
        }
    }
}

#[test]
fn exhaustion_is_idempotent() {
    let grid = filled_cube().build().unwrap();
    let ray = Ray::new(Point::new(-1.0, 8.0, 8.0), Vector::x());
    let mut it = IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 1000.0), None);

    // One interval per 16-unit tile along x.
    assert_eq!(it.by_ref().count(), 4);
    assert_eq!(it.state(), IteratorState::Exhausted);
    for _ in 0..10 {
        assert_eq!(it.next_interval(), None);
    }
}

#[test]
fn rays_pointing_away() {
    let grid = filled_cube().build().unwrap();
    let ray = Ray::new(Point::new(-1.0, 8.0, 8.0), -Vector::x());
    let mut it = IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 1000.0), None);
    assert_eq!(it.next_interval(), None);

    // A negative parametric range still reaches the grid.
    let mut it = IntervalIterator::new(&grid, &ray, ValueRange::new(-1000.0, 0.0), None);
    let interval = it.next_interval().unwrap();
    assert_eq!(interval.t_range, ValueRange::new(-65.0, -49.0));
}

#[test]
fn zero_direction_yields_nothing() {
    let grid = filled_cube().build().unwrap();
    let ray = Ray::new(Point::new(8.0, 8.0, 8.0), Vector::zeros());
    let mut it = IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 1000.0), None);
    assert_eq!(it.state(), IteratorState::Exhausted);
    assert_eq!(it.next_interval(), None);
}

#[test]
fn empty_grid_yields_nothing() {
    let grid = Leaves::default().build().unwrap();
    let ray = Ray::new(Point::new(-1.0, 0.5, 0.5), Vector::x());
    assert_eq!(
        IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 1000.0), None).count(),
        0
    );
}

#[test]
fn selected_values_only() {
    let grid = filled_cube().build().unwrap();
    let ray = Ray::new(Point::new(-1.0, 8.0, 8.0), Vector::x());
    // Tiles crossed along x have values 0, 16, 32 and 48.
    let selector =
        ValueSelector::from_ranges([ValueRange::new(10.0, 20.0), ValueRange::splat(48.0)]);
    let values: Vec<_> =
        IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 1000.0), Some(&selector))
            .map(|interval| interval.value_range.lower)
            .collect();
    assert_eq!(values, vec![16.0, 48.0]);
}

#[test]
fn empty_space_is_skipped() {
    let mut leaves = Leaves::default();
    leaves.tile(3, [0, 0, 0], 1.0);
    leaves.tile(3, [200, 0, 0], 2.0);
    let grid = leaves.build().unwrap();

    let ray = Ray::new(Point::new(-1.0, 1.0, 1.0), Vector::x());
    let intervals: Vec<_> =
        IntervalIterator::new(&grid, &ray, ValueRange::new(0.0, 1000.0), None).collect();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0].t_range, ValueRange::new(1.0, 5.0));
    assert_eq!(intervals[1].t_range, ValueRange::new(201.0, 205.0));
    assert_eq!(intervals[1].depth, 2);
}

#[test]
fn restart_on_another_ray() {
    let grid = filled_cube().build().unwrap();
    let mut it = IntervalIterator::uninitialized(&grid);
    assert_eq!(it.next_interval(), None);

    for y in [8.0, 24.0, 40.0] {
        let ray = Ray::new(Point::new(-1.0, y, 8.0), Vector::x());
        it.init(&ray, ValueRange::new(0.0, 1000.0), None);
        assert_eq!(it.state(), IteratorState::Active);
        assert_eq!(it.by_ref().count(), 4);
    }
}

#[test]
fn one_interval_per_voxel_far_from_the_origin() {
    let mut leaves = Leaves::default();
    leaves.tile(3, [99992, 0, 0], 1.0);
    leaves.tile(3, [100000, 0, 0], 2.0);
    let grid = GridBuilder::new(GridLayout::default())
        .build(&leaves.level, &leaves.origin, &leaves.format, &leaves.data)
        .unwrap();
    let usage = grid.leaf_usage_or_init();
    let t_range = ValueRange::new(0.0, 100.0);

    let backward = Ray::new(Point::new(100010.0, 1.5, 1.5), -Vector::x());
    let intervals: Vec<_> = IntervalIterator::new(&grid, &backward, t_range, None)
        .map(|interval| (interval.t_range, interval.value_range.lower))
        .collect();
    assert_eq!(
        intervals,
        vec![
            (ValueRange::new(2.0, 10.0), 2.0),
            (ValueRange::new(10.0, 18.0), 1.0)
        ]
    );

    let forward = Ray::new(Point::new(99990.0, 1.5, 1.5), Vector::x());
    let intervals: Vec<_> = IntervalIterator::new(&grid, &forward, t_range, None)
        .map(|interval| interval.t_range)
        .collect();
    assert_eq!(
        intervals,
        vec![ValueRange::new(2.0, 10.0), ValueRange::new(10.0, 18.0)]
    );

    let counts: Vec<_> = usage
        .iter()
        .map(|count| count.load(std::sync::atomic::Ordering::Relaxed))
        .collect();
    assert_eq!(counts, vec![2, 2]);
}
