use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nfc_coil::coil::{CoilDesign, Stackup};
use nfc_coil::coupling::{evaluate, CouplingConfig};
use nfc_coil::math::R3;

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("coil_layout");
    for turns in [2_u32, 4, 8] {
        let design = CoilDesign::new(80.0, 60.0, turns, Some(0.3), Some(1.0)).unwrap();
        group.bench_with_input(BenchmarkId::new("two_layer", turns), &design, |b, design| {
            b.iter(|| design.design_copper(Stackup::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_coupling(c: &mut Criterion) {
    let reader = CoilDesign::new(80.0, 60.0, 4, Some(0.3), Some(1.0))
        .unwrap()
        .design_copper(Stackup::default())
        .unwrap();
    let tag = CoilDesign::new(30.0, 40.0, 2, Some(0.3), Some(0.5))
        .unwrap()
        .design_copper(Stackup::default())
        .unwrap();
    let config = CouplingConfig::default();
    let offset = R3::new(25.0, 10.0, 20.0);

    c.bench_function("reader_tag_evaluate", |b| {
        b.iter(|| evaluate(&reader, &tag, &offset, &config).unwrap())
    });
}

criterion_group!(benches, bench_layout, bench_coupling);
criterion_main!(benches);
