//! Benchmarks for netkv frame encoding and decoding

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use netkv::protocol::{decode_frame, encode_frame, Frame};

fn codec_benchmarks(c: &mut Criterion) {
    let frame = Frame::set(
        "benchmark-key",
        vec![0xAB; 1024],
        Duration::from_secs(30),
    );
    let encoded = encode_frame(&frame);

    c.bench_function("encode_frame_1k", |b| {
        b.iter(|| encode_frame(black_box(&frame)))
    });

    c.bench_function("decode_frame_1k", |b| {
        b.iter(|| decode_frame(black_box(&encoded)).unwrap())
    });
}

criterion_group!(benches, codec_benchmarks);
criterion_main!(benches);
