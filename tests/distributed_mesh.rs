mod util;
use sieve_bundle::prelude::*;
use util::*;

#[test]
fn vertex_numbering_spans_both_ranks() {
    let out = run_ranks(2, |comm| {
        let mesh = split_strip(comm);
        let n = mesh.numbering(0, &PointSelector::Depth(0)).unwrap();
        let idx: Vec<Option<u64>> = (1..=3).map(|p| n.index(pid(p))).collect();
        (n.global_size(), n.local_size(), n.offset(), idx, n.is_owned(pid(1)))
    });
    // rank 0 owns all of its vertices
    assert_eq!(out[0], (4, 3, 0, vec![Some(0), Some(1), Some(2)], true));
    // rank 1 owns only global vertex 3; its ghosts carry rank 0's numbers
    assert_eq!(out[1], (4, 1, 3, vec![Some(1), Some(3), Some(2)], false));
}

#[test]
fn cell_numbering_is_disjoint() {
    let out = run_ranks(2, |comm| {
        let mesh = split_strip(comm);
        let n = mesh.numbering(0, &PointSelector::All).unwrap();
        (n.global_size(), n.index(pid(0)))
    });
    // 2 cells + 4 vertices
    assert_eq!(out[0].0, 6);
    assert_eq!(out[1].0, 6);
    assert_ne!(out[0].1, out[1].1);
}

#[test]
fn repeated_numbering_is_served_from_cache() {
    let out = run_ranks(2, |comm| {
        let mesh = split_strip(comm);
        let a = mesh.numbering(0, &PointSelector::Depth(0)).unwrap();
        let b = mesh.numbering(0, &PointSelector::Depth(0)).unwrap();
        (std::sync::Arc::ptr_eq(&a, &b), mesh.factory().computations())
    });
    assert_eq!(out, vec![(true, 1), (true, 1)]);
}

#[test]
fn owner_values_overwrite_ghosts() {
    let out = run_ranks(2, |comm| {
        let mut mesh = split_strip(comm);
        let rank = mesh.rank() as f64;
        mesh.discretization_mut().set_num_dof(0, 2);
        mesh.setup_named_field("u").unwrap();
        let u = mesh.get_real_section("u");
        for p in 1..=3 {
            u.update(0, pid(p), &[rank * 10.0 + p as f64, -1.0]).unwrap();
        }
        mesh.complete_real_section::<CopyDelta>("u", 0).unwrap();
        let u = mesh.real_section("u").unwrap();
        (1..=3)
            .map(|p| u.restrict(0, pid(p)).unwrap().to_vec())
            .collect::<Vec<_>>()
    });
    assert_eq!(out[0], vec![vec![1.0, -1.0], vec![2.0, -1.0], vec![3.0, -1.0]]);
    // rank 1 point 1 aliases rank 0 point 2, point 3 aliases point 3
    assert_eq!(out[1], vec![vec![2.0, -1.0], vec![12.0, -1.0], vec![3.0, -1.0]]);
}

#[test]
fn additive_completion_accumulates_on_owner() {
    let out = run_ranks(2, |comm| {
        let mut section = Section::<f64>::new();
        for p in 1..=3 {
            section.set_fiber_dimension(0, pid(p), 1).unwrap();
        }
        section.allocate().unwrap();
        section.fill(1.0).unwrap();
        // ghosts push to the owner, so invert the owner-to-ghost overlaps
        let owner_view = split_strip(comm);
        let ov = owner_view.topology().overlaps();
        let reversed = OverlapPair { send: ov.recv.clone(), recv: ov.send.clone() };
        complete_section::<f64, AddDelta, _>(&mut section, 0, &reversed, owner_view.comm()).unwrap();
        (1..=3)
            .map(|p| section.restrict(0, pid(p)).unwrap()[0])
            .collect::<Vec<_>>()
    });
    assert_eq!(out[0], vec![1.0, 2.0, 2.0]);
    assert_eq!(out[1], vec![1.0, 1.0, 1.0]);
}

#[test]
fn geometry_is_local_to_each_rank() {
    let out = run_ranks(2, |comm| {
        let mesh = split_strip(comm);
        (
            mesh.locate_point(0, &[0.25, 0.25]).is_ok(),
            mesh.locate_point(0, &[0.75, 0.75]).is_ok(),
            mesh.get_max_volume().unwrap(),
        )
    });
    assert_eq!(out[0], (true, false, 0.25));
    assert_eq!(out[1], (false, true, 0.25));
}

#[test]
fn completing_twice_changes_nothing() {
    let out = run_ranks(2, |comm| {
        let mut mesh = split_strip(comm);
        let rank = mesh.rank() as f64;
        mesh.discretization_mut().set_num_dof(0, 1);
        mesh.setup_named_field("u").unwrap();
        let u = mesh.get_real_section("u");
        for p in 1..=3 {
            u.update(0, pid(p), &[rank * 10.0 + p as f64]).unwrap();
        }
        let snapshot = |m: &Mesh<ThreadComm>| {
            let u = m.real_section("u").unwrap();
            (1..=3)
                .map(|p| u.restrict(0, pid(p)).unwrap()[0])
                .collect::<Vec<_>>()
        };
        mesh.complete_real_section::<CopyDelta>("u", 0).unwrap();
        let once = snapshot(&mesh);
        mesh.complete_real_section::<CopyDelta>("u", 0).unwrap();
        (once, snapshot(&mesh))
    });
    for (once, twice) in &out {
        assert_eq!(once, twice);
    }
    assert_eq!(out[1].0, vec![2.0, 12.0, 3.0]);
}

#[test]
fn empty_bc_table_distributes_as_a_no_op() {
    let out = run_ranks(2, |comm| {
        let mut mesh = split_strip(comm);
        if mesh.rank() == 1 {
            mesh.set_bc_value(4, BcValue::new(1.0, 2.0, 3.0, 4.0));
        }
        mesh.distribute_bc_values().unwrap();
        mesh.bc_values().clone()
    });
    assert!(out[0].is_empty());
    assert_eq!(out[1].len(), 1);
    assert_eq!(out[1][&4], BcValue::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn full_bc_table_reaches_every_rank() {
    let out = run_ranks(2, |comm| {
        let mut mesh = split_strip(comm);
        if mesh.rank() == 0 {
            for id in 0..16 {
                let x = id as f64;
                mesh.set_bc_value(3 * id - 20, BcValue::new(x, -x, 0.5 * x, 1.0e5 + x));
            }
        }
        mesh.distribute_bc_values().unwrap();
        mesh.bc_values().clone()
    });
    assert_eq!(out[0].len(), 16);
    assert_eq!(out[0], out[1]);
    assert_eq!(out[1][&-20], BcValue::new(0.0, -0.0, 0.0, 1.0e5));
}
