//! Energy probes for benchmark harnesses.
//!
//! A probe implements [`EnergyProbe`][energy_harness::EnergyProbe]: it opens a measurement
//! window before each measured payload execution and closes it afterwards, recording what
//! happened in between. Two probes are provided:
//!
//! - [`RaplProbe`] - reads the processor's RAPL energy counters through the Linux `msr` driver
//!   and records an [`EnergySample`] per window, both in memory and as a CSV row.
//! - [`TimerProbe`] - records wall-clock durations, for machines without energy counters.
//!
//! Both probes can be given a [`MeasurementBudget`]. Once the budget is used up the probe
//! answers [`ProbeSignal::Stop`][energy_harness::ProbeSignal::Stop], which ends the run.
//!
//! # Supported processors
//!
//! | Vendor | Domains |
//! |---|---|
//! | Intel | PP0 (cores), PP1 (graphics), package, DRAM |
//! | AMD | core, package |
//!
//! Energy counters are 32 bits wide and wrap around; a window is assumed to be short enough
//! for a counter to wrap at most once.

mod budget;
mod energy_unit;
mod error;
mod pal;
mod rapl;
mod sample;
mod sample_file;
mod timer;
mod vendor;

pub use budget::*;
pub use energy_unit::EnergyUnit;
pub use error::*;
pub use rapl::*;
pub(crate) use sample::csv_header;
pub use sample::{DomainReading, EnergySample};
pub use sample_file::SampleDestination;
pub(crate) use sample_file::SampleFile;
pub use timer::*;
pub use vendor::*;
