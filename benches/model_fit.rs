//! Benchmarks for fitting and forecasting with each model.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use harvest_forecast::core::TrainingSeries;
use harvest_forecast::models::arima::Arima;
use harvest_forecast::models::exponential::{ForecastStrategy, HoltWinters, SimpleExponentialSmoothing};
use harvest_forecast::models::regression::RegressionModel;
use harvest_forecast::models::{select_by_backtest, BoxedForecaster};

fn generate_prices(n: usize) -> TrainingSeries {
    let values = (0..n)
        .map(|i| {
            let t = i as f64;
            50.0 + 0.05 * t + 3.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin() + (i * 31 % 7) as f64 * 0.2
        })
        .collect();
    TrainingSeries::from_values(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), values)
}

fn linear() -> BoxedForecaster {
    Box::new(RegressionModel::linear())
}

fn polynomial3() -> BoxedForecaster {
    Box::new(RegressionModel::polynomial(3))
}

fn ses() -> BoxedForecaster {
    Box::new(SimpleExponentialSmoothing::auto())
}

fn holt_winters() -> BoxedForecaster {
    Box::new(HoltWinters::auto(7).with_strategy(ForecastStrategy::Recursive))
}

fn arima() -> BoxedForecaster {
    Box::new(Arima::auto())
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_predict");
    let factories: [(&str, fn() -> BoxedForecaster); 5] = [
        ("linear", linear),
        ("polynomial3", polynomial3),
        ("ses", ses),
        ("holt_winters", holt_winters),
        ("arima", arima),
    ];

    for size in [60, 180, 365].iter() {
        let series = generate_prices(*size);
        for (name, factory) in factories.iter() {
            group.bench_with_input(BenchmarkId::new(*name, size), size, |b, _| {
                b.iter(|| {
                    let mut model = factory();
                    model.fit(black_box(&series)).unwrap();
                    model.predict(30).unwrap()
                })
            });
        }
    }
    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest_selection");
    group.sample_size(10);
    for size in [90, 365].iter() {
        let series = generate_prices(*size);
        group.bench_with_input(BenchmarkId::new("auto", size), size, |b, _| {
            b.iter(|| select_by_backtest(black_box(&series), 30, 4))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_models, bench_selection);
criterion_main!(benches);
