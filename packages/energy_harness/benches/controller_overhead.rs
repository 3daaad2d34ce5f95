//! Benchmarks to measure the overhead the iteration controller adds around each payload execution.
//!
//! The probe and payload used here do no work of their own, so the measured time is the cost of
//! the controller loop, the measurement window bookkeeping and the report hand-off.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use energy_harness::{
    EnergyProbe, ExecuteError, IterationController, IterationPolicy, Payload, PrepareError,
    ProbeSignal,
};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const REPETITIONS: u64 = 1000;

#[derive(Debug)]
struct NullProbe;

impl EnergyProbe for NullProbe {
    fn begin_measurement(&mut self) -> ProbeSignal {
        ProbeSignal::Continue
    }

    fn end_measurement(&mut self) {}
}

#[derive(Debug)]
struct NullPayload;

impl Payload for NullPayload {
    type State = u64;
    type Output = u64;

    fn prepare(&mut self) -> Result<u64, PrepareError> {
        Ok(0)
    }

    fn execute(&mut self, state: &mut u64) -> Result<u64, ExecuteError> {
        *state = state.wrapping_add(1);
        Ok(*state)
    }
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller_overhead");

    group.bench_function("shared_state", |b| {
        b.iter(|| {
            let mut probe = NullProbe;
            let policy = IterationPolicy::new(REPETITIONS);

            IterationController::new(policy, &mut probe, NullPayload)
                .run(|report| {
                    black_box(report);
                })
                .unwrap()
        });
    });

    group.bench_function("reinitialize_per_iteration", |b| {
        b.iter(|| {
            let mut probe = NullProbe;
            let policy = IterationPolicy::new(REPETITIONS).reinitialize_per_iteration(true);

            IterationController::new(policy, &mut probe, NullPayload)
                .run(|report| {
                    black_box(report);
                })
                .unwrap()
        });
    });

    group.finish();
}
