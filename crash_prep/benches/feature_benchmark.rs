use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use crash_prep::features::text::tokenize;
use crash_prep::features::{CategoricalEncoder, TextVectorizer};
use polars::prelude::*;

const VEHICLES: [&str; 6] = [
    "SEDAN",
    "SEDAN SEDAN",
    "STATION_WAGON/SPORT_UTILITY_VEHICLE BIKE",
    "TAXI",
    "BOX_TRUCK SEDAN BIKE",
    "BUS",
];

const BOROUGHS: [&str; 5] = ["BRONX", "BROOKLYN", "MANHATTAN", "QUEENS", "STATEN ISLAND"];

fn frame(rows: usize) -> DataFrame {
    let vehicles: Vec<&str> = (0..rows).map(|i| VEHICLES[i % VEHICLES.len()]).collect();
    let boroughs: Vec<Option<&str>> = (0..rows)
        .map(|i| (i % 7 != 0).then(|| BOROUGHS[i % BOROUGHS.len()]))
        .collect();
    df!("vehicles" => vehicles, "borough" => boroughs).unwrap()
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    group.bench_function("vehicle_list", |b| {
        b.iter(|| {
            for value in VEHICLES {
                black_box(tokenize(black_box(value)));
            }
        });
    });

    group.finish();
}

fn bench_vectorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorize");

    for rows in [1_000usize, 10_000] {
        let df = frame(rows);
        group.bench_with_input(BenchmarkId::new("text_fit_transform", rows), &df, |b, df| {
            b.iter(|| TextVectorizer::fit_transform(black_box(df), "vehicles").unwrap());
        });
        group.bench_with_input(BenchmarkId::new("categorical_fit_transform", rows), &df, |b, df| {
            b.iter(|| CategoricalEncoder::fit_transform(black_box(df), &["borough"]).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_vectorize);
criterion_main!(benches);
