use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when opening an energy probe.
///
/// Once a probe is open, measurement problems are no longer reported as errors. They surface
/// as a stop signal or a dropped sample instead, and are logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Only one RAPL probe may own the energy counters of a process at a time.
    #[error("another RAPL probe is already open in this process")]
    AlreadyOpen,

    /// The processor description could not be read.
    #[error("cannot read the processor description: {0}")]
    CpuInfo(#[source] io::Error),

    /// The processor vendor has no RAPL interface that this package knows how to read.
    #[error("processor vendor '{vendor_id}' has no supported RAPL interface")]
    UnsupportedVendor {
        /// The `vendor_id` reported by the processor, or an empty string if none was found.
        vendor_id: String,
    },

    /// The MSR device could not be opened. Usually this means the `msr` kernel module is not
    /// loaded or the process lacks the privileges to read it.
    #[error("cannot open the MSR device '{path}': {source}")]
    MsrDevice {
        /// Path of the device.
        path: &'static str,

        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A model-specific register could not be read.
    #[error("cannot read model-specific register {register:#x}: {source}")]
    RegisterRead {
        /// Address of the register.
        register: u32,

        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The sample file could not be opened or its header could not be written.
    #[error("cannot write energy samples to '{}': {source}", path.display())]
    SampleFile {
        /// Path of the sample file.
        path: PathBuf,

        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// A specialized `Result` type for energy probe operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
