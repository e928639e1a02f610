//! Benchmarks for the per-cycle hot path.
//!
//! Run with: cargo bench
//!
//! Everything here executes once (or once per channel) inside every step of
//! the firmware loop, so each operation needs to stay far below the cycle
//! budget of a control-rate loop (~1 kHz on the target hardware).

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use rackstep::dac::{DacChannel, DacFrame};
use rackstep::quantize::{quantize_mv, Scale};
use rackstep::signal::{smoothed_mv, History};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("dac/encode");
    group.bench_function("full_range_sweep", |b| {
        b.iter(|| {
            for v in (0..=4095).step_by(7) {
                black_box(DacFrame::encode(black_box(v), DacChannel::A));
            }
        })
    });
    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize");

    let chromatic = Scale::chromatic();
    group.bench_function("chromatic_nearby", |b| {
        b.iter(|| black_box(quantize_mv(black_box(2450), &chromatic)))
    });

    // single enabled tone forces the widest search
    let sparse = Scale::from_tones(&[0]);
    group.bench_function("sparse_worst_case", |b| {
        b.iter(|| black_box(quantize_mv(black_box(2500), &sparse)))
    });

    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal/smoothing");
    let mut history = History::new();
    let mut raw = 0u16;
    group.bench_function("push_and_average", |b| {
        b.iter(|| {
            raw = (raw + 13) % 1024;
            black_box(smoothed_mv(&mut history, raw, None))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_quantize, bench_smoothing);
criterion_main!(benches);
