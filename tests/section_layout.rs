mod util;
use proptest::prelude::*;
use sieve_bundle::data::section::Section;
use sieve_bundle::mesh_error::MeshError;
use sieve_bundle::topology::Topology;
use util::*;

#[test]
fn bulk_depth_assignment_then_point_override() -> Result<(), MeshError> {
    let mut t = Topology::new(0);
    for (k, v) in [2u64, 3, 4].into_iter().enumerate() {
        t.add_arrow(0, pid(0), pid(v), k as i32);
    }
    t.stratify()?;

    let mut s = Section::<f64>::new();
    s.set_fiber_dimension_by_depth(&t, 0, 0, 2)?;
    s.set_fiber_dimension_by_depth(&t, 0, 1, 1)?;
    s.set_fiber_dimension(0, pid(3), -2)?;
    s.allocate()?;

    assert_eq!(s.size(0), 7);
    assert_eq!(s.free_size(0), 5);
    // offsets follow first declaration order
    let atlas = s.atlas(0).unwrap();
    assert_eq!(atlas.get(pid(2)).unwrap().offset, 0);
    assert_eq!(atlas.get(pid(3)).unwrap().offset, 2);
    assert_eq!(atlas.get(pid(0)).unwrap().offset, 6);

    s.update_bc(0, pid(3), &[1.0, 2.0])?;
    assert_eq!(
        s.update_bc(0, pid(2), &[1.0, 2.0]).unwrap_err(),
        MeshError::NotConstrained { patch: 0, point: pid(2) }
    );
    assert_eq!(
        s.update(0, pid(0), &[1.0, 2.0]).unwrap_err(),
        MeshError::SliceLengthMismatch { point: pid(0), expected: 1, found: 2 }
    );
    s.update_add(0, pid(3), &[0.5, 0.5])?;
    assert_eq!(s.restrict(0, pid(3))?, &[1.5, 2.5]);
    Ok(())
}

#[test]
fn stale_strata_block_bulk_assignment() {
    let mut t = Topology::new(0);
    t.add_arrow(0, pid(0), pid(1), 0);
    let mut s = Section::<i32>::new();
    assert_eq!(
        s.set_fiber_dimension_by_depth(&t, 0, 0, 1).unwrap_err(),
        MeshError::StrataStale(0)
    );
}

#[test]
fn patches_are_laid_out_independently() -> Result<(), MeshError> {
    let mut s = Section::<i32>::new();
    s.set_fiber_dimension(0, pid(1), 2)?;
    s.set_fiber_dimension(1, pid(1), 3)?;
    s.allocate()?;
    s.update(1, pid(1), &[7, 8, 9])?;
    assert_eq!(s.restrict(0, pid(1))?, &[0, 0]);
    assert_eq!(s.restrict(1, pid(1))?, &[7, 8, 9]);
    assert_eq!(s.patches().collect::<Vec<_>>(), vec![0, 1]);
    s.zero()?;
    assert_eq!(s.raw(1).unwrap(), &[0, 0, 0]);
    Ok(())
}

proptest! {
    #[test]
    fn layout_is_a_prefix_sum_of_abs_dims(
        dims in prop::collection::vec((0u64..30, -4i32..5), 0..40)
    ) {
        let mut s = Section::<i64>::new();
        let mut last: Vec<(u64, i32)> = Vec::new();
        for &(p, d) in &dims {
            s.set_fiber_dimension(0, pid(p), d).unwrap();
            match last.iter_mut().find(|(q, _)| *q == p) {
                Some(e) => e.1 = d,
                None => last.push((p, d)),
            }
        }
        s.allocate().unwrap();

        let total: usize = last.iter().map(|(_, d)| d.unsigned_abs() as usize).sum();
        let free: usize = last.iter().filter(|(_, d)| *d > 0).map(|(_, d)| *d as usize).sum();
        prop_assert_eq!(s.size(0), total);
        prop_assert_eq!(s.free_size(0), free);

        let mut offset = 0;
        for &(p, d) in &last {
            let span = s.atlas(0).unwrap().get(pid(p)).unwrap();
            prop_assert_eq!(span.offset, offset);
            prop_assert_eq!(s.restrict(0, pid(p)).unwrap().len(), d.unsigned_abs() as usize);
            offset += d.unsigned_abs() as usize;
        }
        for &(p, d) in &last {
            let vals: Vec<i64> = (0..d.unsigned_abs() as i64).map(|k| p as i64 * 100 + k).collect();
            s.update(0, pid(p), &vals).unwrap();
        }
        for &(p, _) in &last {
            let got = s.restrict(0, pid(p)).unwrap();
            for (k, v) in got.iter().enumerate() {
                prop_assert_eq!(*v, p as i64 * 100 + k as i64);
            }
        }
    }
}
