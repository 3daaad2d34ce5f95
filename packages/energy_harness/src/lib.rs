//! Bracket benchmark payloads with energy measurement windows.
//!
//! Energy benchmarks all follow the same shape: prepare some state, open an energy accounting
//! window, run the kernel, close the window, and repeat - sometimes after a few unmeasured warm-up
//! runs, sometimes re-creating the state before every run. This package implements that shape once
//! so that individual benchmarks only supply the kernel.
//!
//! The core functionality includes:
//! - [`EnergyProbe`] - The two-call contract of the energy accounting subsystem
//! - [`MeasurementWindow`] - Guard that closes an open window on every exit path
//! - [`Payload`] - The `prepare` / `execute` / `teardown` contract of a benchmark kernel
//! - [`IterationPolicy`] - Repetitions, warm-up repetitions and reinitialization behavior
//! - [`IterationController`] - The run loop that ties the above together
//! - [`RunReport`] - One record per completed measured iteration
//! - [`Harness`] - The outermost driver for one benchmark process
//!
//! # Operating principles
//!
//! ## One window per measured execution
//!
//! Every measured iteration is bracketed by exactly one matched `begin_measurement()` /
//! `end_measurement()` pair around exactly one `execute()` call. The window is closed even if
//! `execute()` fails or panics.
//!
//! ## The probe decides when to stop
//!
//! [`EnergyProbe::begin_measurement()`] may answer [`ProbeSignal::Stop`], for example because the
//! accounting subsystem has collected enough samples. The run ends immediately: no window is
//! opened and the payload is not executed for that iteration.
//!
//! ## Failures are contained where possible
//!
//! A failing `execute()` discards only its own iteration; the run continues. A failing
//! `prepare()` or an unavailable probe ends the run with an [`Error`].
//!
//! # Example
//!
//! ```
//! use energy_harness::{
//!     EnergyProbe, ExecuteError, IterationController, IterationPolicy, Payload, PrepareError,
//!     ProbeSignal,
//! };
//!
//! #[derive(Debug, Default)]
//! struct WindowCounter(u32);
//!
//! impl EnergyProbe for WindowCounter {
//!     fn begin_measurement(&mut self) -> ProbeSignal {
//!         self.0 += 1;
//!         ProbeSignal::Continue
//!     }
//!
//!     fn end_measurement(&mut self) {}
//! }
//!
//! #[derive(Debug)]
//! struct Harmonic {
//!     limit: f64,
//! }
//!
//! impl Payload for Harmonic {
//!     type State = ();
//!     type Output = u64;
//!
//!     fn prepare(&mut self) -> Result<(), PrepareError> {
//!         Ok(())
//!     }
//!
//!     fn execute(&mut self, _: &mut ()) -> Result<u64, ExecuteError> {
//!         let mut sum = 0.0;
//!         let mut n = 0;
//!         while sum < self.limit {
//!             n += 1;
//!             sum += 1.0 / n as f64;
//!         }
//!         Ok(n)
//!     }
//! }
//!
//! let mut probe = WindowCounter::default();
//! let policy = IterationPolicy::new(5).with_warmup(2);
//!
//! let summary = IterationController::new(policy, &mut probe, Harmonic { limit: 5.0 })
//!     .run(|report| println!("{report}"))
//!     .unwrap();
//!
//! assert_eq!(summary.reports_emitted(), 5);
//! assert_eq!(probe.0, 5);
//! ```

mod controller;
mod error;
mod harness;
mod payload;
mod policy;
mod probe;
mod report;

#[cfg(any(test, feature = "fakes"))]
pub mod fakes;

pub use controller::*;
pub use error::*;
pub use harness::*;
pub use payload::*;
pub use policy::*;
pub use probe::*;
pub use report::*;
