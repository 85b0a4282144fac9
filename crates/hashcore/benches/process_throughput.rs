use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hashcore::{Algorithm, Context, HashOptions, noop_progress};

const INPUT_LEN: usize = 8 * 1024 * 1024;

fn bench_buffer_sizes(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.bin");
    std::fs::write(&path, vec![0xa5u8; INPUT_LEN]).unwrap();

    let mut group = c.benchmark_group("process_buffer_size");
    group.throughput(Throughput::Bytes(INPUT_LEN as u64));

    for buffer_size in [4 * 1024, 64 * 1024, 1024 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("xxh64", buffer_size),
            &buffer_size,
            |b, &buffer_size| {
                b.iter(|| {
                    let options = HashOptions::new().buffer_size(buffer_size);
                    let mut ctx = Context::open(&path, options).unwrap();
                    ctx.process(noop_progress).unwrap();
                    black_box(ctx.finalize().unwrap())
                });
            },
        );
    }
    group.finish();
}

fn bench_algorithms(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.bin");
    std::fs::write(&path, vec![0x3cu8; INPUT_LEN]).unwrap();

    let mut group = c.benchmark_group("process_algorithm");
    group.throughput(Throughput::Bytes(INPUT_LEN as u64));

    for algorithm in [Algorithm::default(), Algorithm::Sha256, Algorithm::Blake3] {
        group.bench_with_input(
            BenchmarkId::new("algorithm", algorithm),
            &algorithm,
            |b, &algorithm| {
                b.iter(|| {
                    let options = HashOptions::new().algorithm(algorithm);
                    let mut ctx = Context::open(&path, options).unwrap();
                    ctx.process(noop_progress).unwrap();
                    black_box(ctx.finalize().unwrap())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(process_benches, bench_buffer_sizes, bench_algorithms);
criterion_main!(process_benches);
