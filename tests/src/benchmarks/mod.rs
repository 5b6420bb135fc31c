//! # Swap Benchmarks
//!
//! Hot paths hit on every escrow operation: hashing the secret, building the
//! commitment, packing the timelock word and deriving escrow ids.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use htlc_swap::algorithms::timelock_codec;
use htlc_swap::domain::{Immutables, Stage, TimelockSchedule, Timelocks};
use htlc_swap::{
    escrow_id, generate_nonce, generate_secret, hash_secret, pack, secret_commitment, unpack,
    Address, Side, Token,
};
use std::time::Duration;

/// Secret hashing and commitment.
pub fn bench_secret(c: &mut Criterion) {
    let mut group = c.benchmark_group("secret");
    group.measurement_time(Duration::from_secs(5));

    let secret = generate_secret();
    let nonce = generate_nonce();

    group.bench_function("hash_secret", |b| {
        b.iter(|| black_box(hash_secret(black_box(&secret))))
    });
    group.bench_function("secret_commitment", |b| {
        b.iter(|| black_box(secret_commitment(black_box(&secret), black_box(&nonce))))
    });
    group.bench_function("generate_secret", |b| b.iter(|| black_box(generate_secret())));

    group.finish();
}

/// Packing and reading the 256-bit timelock word.
pub fn bench_timelock_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("timelock-codec");
    let schedule = TimelockSchedule::default();

    group.bench_function("pack", |b| {
        b.iter(|| black_box(pack(black_box(&schedule), black_box(1_700_000_000))))
    });

    let word = pack(&schedule, 1_700_000_000);
    group.bench_function("unpack_all_stages", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for stage in Stage::ALL {
                sum += unpack(black_box(word), stage);
            }
            black_box(sum)
        })
    });
    group.bench_function("decode_checked", |b| {
        b.iter(|| black_box(timelock_codec::decode_checked(black_box(word))))
    });

    group.finish();
}

/// Escrow id derivation across address lengths.
pub fn bench_escrow_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("escrow-id");

    for len in [20usize, 34, 64] {
        let immutables = Immutables {
            order_hash: [1; 32],
            hashlock: [2; 32],
            side: Side::Source,
            maker: Address::new("m".repeat(len)),
            taker: Address::new("t".repeat(len)),
            token: Token::Native,
            amount: 1_000,
            safety_deposit: 10,
            timelocks: Timelocks {
                schedule: TimelockSchedule::default(),
                deployed_at: 1_700_000_000,
            },
        };
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("escrow_id", len), &immutables, |b, imm| {
            b.iter(|| black_box(escrow_id(black_box(imm))))
        });
    }

    group.finish();
}
