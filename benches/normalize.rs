use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nyiso::{normalize, pivot_zones, resample_hourly, DatasetRegistry, NYISO_ZONES};
use polars::prelude::*;

/// One month of five-minute real-time LMP rows for every zone, as raw strings.
fn raw_month() -> DataFrame {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut stamps = Vec::new();
    let mut zones = Vec::new();
    let mut prices = Vec::new();
    for step in 0..(31 * 24 * 12) {
        let stamp = (start + Duration::minutes(5 * step))
            .format("%m/%d/%Y %H:%M:%S")
            .to_string();
        for (i, zone) in NYISO_ZONES.iter().enumerate() {
            stamps.push(stamp.clone());
            zones.push(zone.to_string());
            prices.push(format!("{:.2}", 30.0 + (step % 288) as f64 * 0.1 + i as f64));
        }
    }
    df!(
        "Time Stamp" => stamps,
        "Name" => zones,
        "LBMP ($/MWHr)" => prices,
    )
    .unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let registry = DatasetRegistry::nyiso();
    let descriptor = registry.get("lmp_realtime").unwrap().clone();
    let raw = raw_month();

    c.bench_function("normalize_lmp_month", |b| {
        b.iter(|| normalize(black_box(&raw), &descriptor, &registry))
    });

    let canonical = normalize(&raw, &descriptor, &registry).unwrap();
    c.bench_function("resample_hourly_by_zone", |b| {
        b.iter(|| resample_hourly(black_box(&canonical), "lmp_total", &["zone"]))
    });
    c.bench_function("pivot_zones", |b| {
        b.iter(|| pivot_zones(black_box(&canonical), "lmp_total"))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
