//! Benchmarks for the codec and random number primitives.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use playground::codec::base64;
use playground::{Blowfish, MersenneTwister};

const BENCH_KEY: &[u8] = b"BenchmarkKey2024";

fn bench_blowfish_key_schedule(c: &mut Criterion) {
    c.bench_function("blowfish_key_schedule", |b| {
        b.iter(|| Blowfish::new(black_box(BENCH_KEY)).unwrap());
    });
}

fn bench_blowfish_block(c: &mut Criterion) {
    let bf = Blowfish::new(BENCH_KEY).unwrap();

    let mut group = c.benchmark_group("blowfish_block");
    group.throughput(Throughput::Bytes(8));
    group.bench_function("encrypt", |b| {
        let mut block = [0x5au8; 8];
        b.iter(|| bf.encrypt_block(black_box(&mut block)));
    });
    group.bench_function("decrypt", |b| {
        let mut block = [0x5au8; 8];
        b.iter(|| bf.decrypt_block(black_box(&mut block)));
    });
    group.finish();
}

fn bench_base64(c: &mut Criterion) {
    let data: Vec<u8> = (0..1024u32).map(|i| (i * 31 % 251) as u8).collect();
    let text = base64::encode(&data);

    let mut group = c.benchmark_group("base64_1k");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| base64::encode(black_box(&data)));
    });
    group.bench_function("decode", |b| {
        b.iter(|| base64::decode(black_box(&text)).unwrap());
    });
    group.finish();
}

fn bench_rand32(c: &mut Criterion) {
    let mut rng = MersenneTwister::with_seed(5489);

    let mut group = c.benchmark_group("mersenne_twister");
    group.throughput(Throughput::Elements(1));
    group.bench_function("rand32", |b| {
        b.iter(|| black_box(rng.rand32()));
    });
    group.bench_function("rand_range", |b| {
        b.iter(|| black_box(rng.rand_range(black_box(1), black_box(6))));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_blowfish_key_schedule,
    bench_blowfish_block,
    bench_base64,
    bench_rand32,
);
criterion_main!(benches);
