use crate::common::{random_leaves, Leaves};
use vdbtrace::grid::Filter;
use vdbtrace::math::{Point, Real, Vector};
use vdbtrace::query::{HitIterator, IteratorState, Ray, ValueSelector};
use vdbtrace::utils::ValueRange;

#[test]
fn hits_are_strictly_increasing() {
    let mut rng = oorandom::Rand32::new(17);
    let leaves = random_leaves(&mut rng, [0, 0, 0]);
    let grid = leaves.build().unwrap();
    let isovalues = ValueSelector::from_values([-2.0, 0.0, 2.5]);
    let t_range = ValueRange::new(0.0, Real::MAX);
    let mut num_hits = 0;

    for _ in 0..100 {
        let dir = Vector::from_fn(|_, _| rng.rand_float() * 2.0 - 1.0);
        let ray = Ray::new(Point::new(32.0, 32.0, 32.0) - dir.normalize() * 100.0, dir);

        let hits: Vec<_> = HitIterator::new(&grid, &ray, t_range, &isovalues).collect();
        for w in hits.windows(2) {
            assert!(w[0].t < w[1].t, "{:?}", hits);
        }
        for hit in &hits {
            assert!(isovalues.values().contains(&hit.sample));
            let value = grid.sample_index(&ray.point_at(hit.t), Filter::Trilinear);
            assert!((value - hit.sample).abs() < 1.0e-2, "{:?} {}", hit, value);
        }
        num_hits += hits.len();
    }

    assert!(num_hits > 0);
}

#[test]
fn every_sign_change_is_found() {
    let mut rng = oorandom::Rand32::new(5);
    let grid = random_leaves(&mut rng, [0, 0, 0]).build().unwrap();
    let isovalues = [-2.0, 1.0, 2.5];
    let selector = ValueSelector::from_values(isovalues);
    let step = 0.05;

    for _ in 0..20 {
        let dir = Vector::from_fn(|_, _| rng.rand_float() * 2.0 - 1.0).normalize();
        let ray = Ray::new(Point::new(32.0, 32.0, 32.0) - dir * 80.0, dir);
        let hits: Vec<_> = HitIterator::new(&grid, &ray, ValueRange::new(0.0, 160.0), &selector)
            .with_step_scale(step)
            .collect();
        let field = |t: Real| grid.sample_index(&ray.point_at(t), Filter::Trilinear);

        // Dense sampling of the whole ray, keeping the clear-cut crossings.
        let mut t = 0.0;
        while t < 160.0 {
            let (fa, fb) = (field(t), field(t + step));
            for iso in isovalues {
                let (da, db) = (fa - iso, fb - iso);
                if da * db < 0.0 && da.abs() > 0.05 && db.abs() > 0.05 {
                    assert!(
                        hits.iter().any(|hit| hit.sample == iso
                            && hit.t > t - step
                            && hit.t < t + 2.0 * step),
                        "missed {} in [{}, {}]",
                        iso,
                        t,
                        t + step
                    );
                }
            }
            t += step;
        }
    }
}

#[test]
fn leaves_bordering_empty_space() {
    // A tile with empty space on both sides, crossed in both directions.
    let mut leaves = Leaves::default();
    leaves.tile(3, [8, 0, 0], 2.0);
    let grid = leaves.build().unwrap();
    let isovalues = ValueSelector::from_values([1.0]);
    let t_range = ValueRange::new(0.0, 100.0);

    let forward = Ray::new(Point::new(0.0, 1.5, 1.5), Vector::x());
    let t: Vec<_> = HitIterator::new(&grid, &forward, t_range, &isovalues)
        .map(|hit| hit.t)
        .collect();
    assert_eq!(t.len(), 2);
    approx::assert_relative_eq!(t[0], 7.5, epsilon = 1.0e-3);
    approx::assert_relative_eq!(t[1], 11.5, epsilon = 1.0e-3);

    let backward = Ray::new(Point::new(20.0, 1.5, 1.5), -Vector::x());
    let t: Vec<_> = HitIterator::new(&grid, &backward, t_range, &isovalues)
        .map(|hit| hit.t)
        .collect();
    assert_eq!(t.len(), 2);
    approx::assert_relative_eq!(t[0], 8.5, epsilon = 1.0e-3);
    approx::assert_relative_eq!(t[1], 12.5, epsilon = 1.0e-3);

    // Across the corner of the tile, off every axis.
    let diagonal = Ray::new(Point::new(6.0, -1.5, -1.0), Vector::new(1.0, 1.0, 1.0));
    let hits: Vec<_> = HitIterator::new(&grid, &diagonal, t_range, &isovalues).collect();
    assert_eq!(hits.len(), 2);
    for hit in &hits {
        let value = grid.sample_index(&diagonal.point_at(hit.t), Filter::Trilinear);
        approx::assert_relative_eq!(value, 1.0, epsilon = 1.0e-2);
    }
}

#[test]
fn crossing_between_two_tiles() {
    // Two tiles side by side: the trilinear field goes from 0 to 1 over the last
    // voxel of the first tile.
    let mut leaves = Leaves::default();
    leaves.tile(3, [0, 0, 0], 0.0);
    leaves.tile(3, [4, 0, 0], 1.0);
    let grid = leaves.build().unwrap();

    let ray = Ray::new(Point::new(-1.0, 1.5, 1.5), Vector::x());
    let isovalues = ValueSelector::from_values([0.5]);
    let hits: Vec<_> =
        HitIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), &isovalues).collect();

    // Rising at x = 3.5, then falling towards the background at x = 7.5.
    assert_eq!(hits.len(), 2);
    approx::assert_relative_eq!(hits[0].t, 4.5, epsilon = 1.0e-3);
    approx::assert_relative_eq!(hits[1].t, 8.5, epsilon = 1.0e-3);
}

#[test]
fn exhaustion_is_idempotent() {
    let mut leaves = Leaves::default();
    leaves.dense(3, [0, 0, 0], (0..64).map(|i| (i >> 4) as f32).collect());
    let grid = leaves.build().unwrap();

    let ray = Ray::new(Point::new(-1.0, 1.5, 1.5), Vector::x());
    let isovalues = ValueSelector::from_values([0.5]);
    let mut hits = HitIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), &isovalues);

    while hits.next_hit().is_some() {}
    assert_eq!(hits.state(), IteratorState::Exhausted);
    for _ in 0..10 {
        assert_eq!(hits.next_hit(), None);
    }
}

#[test]
fn zero_direction_yields_nothing() {
    let mut leaves = Leaves::default();
    leaves.tile(2, [0, 0, 0], 1.0);
    let grid = leaves.build().unwrap();

    let ray = Ray::new(Point::new(1.0, 1.0, 1.0), Vector::zeros());
    let isovalues = ValueSelector::from_values([1.0]);
    let mut hits = HitIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), &isovalues);
    assert_eq!(hits.next_hit(), None);
}

#[test]
fn step_scale_does_not_reorder() {
    let mut leaves = Leaves::default();
    leaves.dense(3, [0, 0, 0], (0..64).map(|i| ((i >> 4) % 2) as f32).collect());
    let grid = leaves.build().unwrap();

    let ray = Ray::new(Point::new(-1.0, 1.5, 1.5), Vector::x());
    let isovalues = ValueSelector::from_values([0.5]);
    let fine: Vec<_> = HitIterator::new(&grid, &ray, ValueRange::new(0.0, 100.0), &isovalues)
        .with_step_scale(0.25)
        .map(|hit| hit.t)
        .collect();

    // Values 0, 1, 0, 1 along x: crossings at x = 0.5, 1.5, 2.5, and 3.5 on the way
    // back to the background.
    assert_eq!(fine.len(), 4);
    for (t, expected) in fine.iter().zip([1.5, 2.5, 3.5, 4.5]) {
        approx::assert_relative_eq!(*t, expected, epsilon = 1.0e-3);
    }
}
