//! # Cross-Chain Swap Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | keccak256 hashlock | < 1μs |
//! | Timelock pack/unpack | < 1μs |
//! | Escrow id derivation | < 5μs |

use criterion::{criterion_group, criterion_main};
use swap_tests::benchmarks::{bench_escrow_id, bench_secret, bench_timelock_codec};

criterion_group!(benches, bench_secret, bench_timelock_codec, bench_escrow_id);
criterion_main!(benches);
