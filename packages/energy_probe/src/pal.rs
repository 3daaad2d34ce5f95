//! Platform abstraction layer for reading energy counters.
//!
//! All access to `/proc/cpuinfo`, the MSR device and the system clock goes through
//! [`Platform`], so that probe logic can be tested against a mock without root privileges or
//! RAPL-capable hardware.

mod abstractions;
mod facade;
mod real;

pub(crate) use abstractions::*;
pub(crate) use facade::*;
pub(crate) use real::*;
