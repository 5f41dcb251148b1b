// Streaming zstd decoder benchmarks
//
// Run with: cargo bench -p kelp-compression --bench decode_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kelp_compression::{ContentDecoder, ZstdDecoder};

fn sample_stream(frames: usize, frame_size: usize) -> (Vec<u8>, usize) {
    let payload = "The quick brown fox jumps over the lazy dog. "
        .repeat(frame_size / 45 + 1)
        .into_bytes();
    let payload = &payload[..frame_size];

    let stream = (0..frames)
        .flat_map(|_| zstd::encode_all(payload, 3).unwrap())
        .collect();
    (stream, frames * frame_size)
}

fn benchmark_chunk_sizes(c: &mut Criterion) {
    let (stream, decoded_len) = sample_stream(4, 256 * 1024);

    let mut group = c.benchmark_group("zstd_decode_chunk_size");
    group.throughput(Throughput::Bytes(decoded_len as u64));

    for chunk_size in [512, 4 * 1024, 16 * 1024, 64 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = ZstdDecoder::new().unwrap();
                    let mut total = 0;
                    for chunk in stream.chunks(chunk_size) {
                        total += decoder.decode(black_box(chunk)).len();
                    }
                    total += decoder.flush().unwrap().len();
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

fn benchmark_frame_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("zstd_decode_frames");

    for frames in [1, 16, 256] {
        let (stream, decoded_len) = sample_stream(frames, 1024 * 1024 / frames);
        group.throughput(Throughput::Bytes(decoded_len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &stream, |b, stream| {
            b.iter(|| {
                let mut decoder = ZstdDecoder::new().unwrap();
                let out = decoder.decode(black_box(stream));
                decoder.flush().unwrap();
                black_box(out)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_chunk_sizes, benchmark_frame_count);
criterion_main!(benches);
