use std::fmt::Debug;
use std::io;
use std::time::SystemTime;

/// Operating system services that the RAPL probe depends on.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Returns the text of `/proc/cpuinfo` or an equivalent description of the processors.
    fn cpu_info(&self) -> io::Result<String>;

    /// Opens the MSR device of the first processor. Opening an already open device is a no-op.
    fn open_msr_device(&self) -> io::Result<()>;

    /// Reads one 64-bit model-specific register from the device opened by `open_msr_device()`.
    fn read_msr(&self, register: u32) -> io::Result<u64>;

    /// The current wall-clock time, used to timestamp measurement windows.
    fn now(&self) -> SystemTime;
}
