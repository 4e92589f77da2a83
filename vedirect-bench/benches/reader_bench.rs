//! Read loop and serial test benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use vedirect_core::{RawSuite, ReadOptions, SerialTestEvaluator, Vedirect};
use vedirect_protocol::{Encoder, Record};

fn create_stream(frames: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    for i in 0..frames {
        let v = format!("{}", 12_000 + i);
        let frame = Encoder::encode_fields([("PID", "0x204"), ("V", v.as_str()), ("I", "-150")])
            .unwrap();
        bytes.extend_from_slice(&frame);
    }
    bytes
}

fn bench_read_with_callback(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_with_callback");

    for frames in [1u32, 10, 100] {
        let stream = create_stream(frames as usize);
        let options = ReadOptions::new(Duration::from_secs(10)).with_max_loops(frames);

        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &stream, |b, stream| {
            b.iter(|| {
                let mut reader = Vedirect::new(Cursor::new(stream.as_slice()));
                let mut fields = 0;
                reader
                    .read_with_callback(|record| fields += record.len(), &options)
                    .unwrap();
                black_box(fields)
            });
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let raw: RawSuite = serde_json::from_value(json!({
        "PIDTest": {"typeTest": "value", "key": "PID", "value": "0x204"},
        "colsCheck": {"typeTest": "columns", "keys": ["V", "I", "P", "CE", "SOC"]}
    }))
    .unwrap();
    let evaluator = SerialTestEvaluator::from_raw(&raw).unwrap();
    let record: Record = [
        ("PID", "0x204"),
        ("V", "12800"),
        ("I", "-150"),
        ("P", "-2"),
        ("CE", "-13000"),
        ("SOC", "876"),
        ("TTG", "-1"),
    ]
    .into_iter()
    .collect();

    c.bench_function("serial_test_evaluate", |b| {
        b.iter(|| black_box(evaluator.evaluate(&record)));
    });
}

criterion_group!(benches, bench_read_with_callback, bench_evaluate);

criterion_main!(benches);
