//! Benchmarks for indicator implementations.

use bracket_core::traits::{Indicator, MultiOutputIndicator};
use bracket_indicators::{BollingerBands, Ema, Lsma, Rsi, Sma, StochRsi};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("moving_average");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("sma_20", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("ema_20", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("lsma_55", size), &data, |b, data| {
            let lsma = Lsma::new(55);
            b.iter(|| lsma.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_momentum(c: &mut Criterion) {
    let mut group = c.benchmark_group("momentum");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("rsi_14", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("stoch_rsi", size), &data, |b, data| {
            let stoch = StochRsi::new();
            b.iter(|| stoch.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_bands(c: &mut Criterion) {
    let mut group = c.benchmark_group("bollinger");

    for size in [1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("bb_20_2", size), &data, |b, data| {
            let bb = BollingerBands::new();
            b.iter(|| bb.calculate(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_moving_averages, benchmark_momentum, benchmark_bands);
criterion_main!(benches);
