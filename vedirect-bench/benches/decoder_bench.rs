//! Frame encoding/decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vedirect_protocol::{checksum_byte, Encoder, FrameDecoder, Record};

/// A BMV-style record with `fields` numbered fields after the PID.
fn create_test_record(fields: usize) -> Record {
    let mut record = Record::new();
    record.insert("PID", "0x204");
    for i in 0..fields {
        record.insert(format!("F{i}"), format!("{}", 12_000 + i));
    }
    record
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for fields in [4, 16, 32] {
        let record = create_test_record(fields);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &record, |b, record| {
            b.iter(|| black_box(Encoder::encode_record(record).unwrap()));
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for fields in [4, 16, 32] {
        let encoded = Encoder::encode_record(&create_test_record(fields)).unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &encoded, |b, encoded| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                black_box(decoder.decode_all(encoded).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_frame_decode_with_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode_with_hex");

    // Text fields interleaved with asynchronous hex lines.
    let mut body = b"\r\nPID\t0x204".to_vec();
    for i in 0..16 {
        let line = format!("\r\n:A0102000{i:03}\n\r\nF{i}\t{}", 12_000 + i);
        body.extend_from_slice(line.as_bytes());
    }
    body.extend_from_slice(b"\r\nChecksum\t");
    body.push(checksum_byte(&body));

    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("16_fields", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            black_box(decoder.decode_all(&body).unwrap())
        });
    });

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    for size in [64, 256, 1024] {
        let data = vec![0x42u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(checksum_byte(data)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_frame_decode_with_hex,
    bench_checksum,
);

criterion_main!(benches);
