use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polaris_drive::collectors::radio::ChannelFamily;
use polaris_drive::collectors::radio::frequency::lookup;
use polaris_drive::models::{CellMeasurement, DriveSample, Location};
use polaris_drive::remote::UploadRecord;
use std::collections::BTreeMap;

/// Benchmark channel resolution for every family, hits and misses
fn benchmark_channel_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_lookup");

    let cases = [
        (ChannelFamily::Gsm, 62),
        (ChannelFamily::Umts, 10700),
        (ChannelFamily::Lte, 1300),
        (ChannelFamily::Lte, 2700),
        (ChannelFamily::Nr, 632628),
    ];
    for (family, channel) in cases {
        group.bench_with_input(
            BenchmarkId::new(family.label(), channel),
            &channel,
            |b, &channel| {
                b.iter(|| black_box(lookup(family, black_box(channel))));
            },
        );
    }

    group.finish();
}

/// Benchmark converting stored samples into upload records
fn benchmark_record_conversion(c: &mut Criterion) {
    let samples: Vec<DriveSample> = (0..1_000)
        .map(|i| {
            DriveSample::merge(
                "bench-device",
                1_700_000_000_000 + i * 5_000,
                Location::new(52.0, 4.0),
                CellMeasurement::default(),
                &BTreeMap::new(),
                "",
            )
        })
        .collect();

    c.bench_function("upload_records_1000", |b| {
        b.iter(|| {
            let records: Vec<UploadRecord> = samples.iter().map(UploadRecord::from).collect();
            black_box(records);
        });
    });
}

criterion_group!(benches, benchmark_channel_lookup, benchmark_record_conversion);
criterion_main!(benches);
