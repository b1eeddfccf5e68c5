use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use sieve_bundle::algs::communicator::NoComm;
use sieve_bundle::mesh::{Mesh, MeshBuilder};

/// `n × n` unit squares, each split into two triangles.
fn triangulated_grid(n: usize) -> Mesh {
    let mut cells = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v = j * (n + 1) + i;
            cells.push(vec![v, v + 1, v + n + 1]);
            cells.push(vec![v + n + 2, v + n + 1, v + 1]);
        }
    }
    let h = 1.0 / n as f64;
    let mut coords = Vec::with_capacity(2 * (n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            coords.push(i as f64 * h);
            coords.push(j as f64 * h);
        }
    }
    MeshBuilder::from_cells(NoComm, 2, &cells, &coords, 2, 0).expect("valid grid")
}

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate_point");

    for &n in &[8usize, 32] {
        let mesh = triangulated_grid(n);
        group.bench_with_input(BenchmarkId::new("near_origin", n), &n, |b, _| {
            b.iter(|| black_box(mesh.locate_point(0, black_box(&[0.01, 0.01]))))
        });
        group.bench_with_input(BenchmarkId::new("far_corner", n), &n, |b, _| {
            b.iter(|| black_box(mesh.locate_point(0, black_box(&[0.99, 0.99]))))
        });
        group.bench_with_input(BenchmarkId::new("max_volume", n), &n, |b, _| {
            b.iter(|| black_box(mesh.get_max_volume()))
        });
    }
    group.finish();
}

fn bench_stratify(c: &mut Criterion) {
    let mut group = c.benchmark_group("stratify");
    for &n in &[32usize, 64] {
        let mesh = triangulated_grid(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter_batched(
                || {
                    let mut t = sieve_bundle::topology::Topology::new(0);
                    for &cell in mesh.topology().height_stratum(0, 0).expect("stratified") {
                        for (k, v) in mesh.topology().cone(0, cell).enumerate() {
                            t.add_arrow(0, cell, v, k as i32);
                        }
                    }
                    t
                },
                |mut t| black_box(t.stratify()),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_locate, bench_stratify);
criterion_main!(benches);
