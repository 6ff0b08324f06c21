//! Benchmarks for decoding one simulated transponder frame.
//!
//! Measures the host-side cost of the bit-cell decoder against the
//! simulated front end, which is dominated by per-tick bookkeeping.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench decode_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use petflap_hardware::mock::{SimClock, SimTransponder};
use petflap_rfid::Decoder;
use std::hint::black_box;

/// Benchmark a successful decode attempt.
fn bench_decode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    group.throughput(Throughput::Elements(1));

    let clock = SimClock::new();
    let (reader, handle) = SimTransponder::new(clock.clone());
    handle.present_tag([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x00, 0x01]);
    let mut decoder = Decoder::new(reader);

    group.bench_function("decode_valid_frame", |b| {
        b.iter(|| {
            let read = decoder.decode(black_box(&clock)).unwrap();
            black_box(read);
        });
    });

    group.finish();
}

/// Benchmark an attempt with an empty field, which spins for the whole
/// synchronization budget.
fn bench_decode_empty_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_empty_field");

    let clock = SimClock::new();
    let (reader, _handle) = SimTransponder::new(clock.clone());
    let mut decoder = Decoder::new(reader);

    group.bench_function("decode_no_tag", |b| {
        b.iter(|| {
            let result = decoder.decode(black_box(&clock));
            black_box(result.is_err());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decode_frame, bench_decode_empty_field);
criterion_main!(benches);
