use std::fs::{self, File};
use std::io;
use std::sync::OnceLock;
use std::time::SystemTime;

use crate::pal::Platform;

/// The MSR device of the first processor. Package-level RAPL counters can be read from any
/// processor of the package, so one device is enough.
pub(crate) const MSR_DEVICE_PATH: &str = "/dev/cpu/0/msr";

const CPU_INFO_PATH: &str = "/proc/cpuinfo";

pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform::new();

/// Reads from the real operating system that the build is targeting.
///
/// The MSR device is opened at most once per process and stays open until the process exits.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    msr_device: OnceLock<File>,
}

impl BuildTargetPlatform {
    const fn new() -> Self {
        Self {
            msr_device: OnceLock::new(),
        }
    }
}

impl Platform for BuildTargetPlatform {
    fn cpu_info(&self) -> io::Result<String> {
        fs::read_to_string(CPU_INFO_PATH)
    }

    fn open_msr_device(&self) -> io::Result<()> {
        if self.msr_device.get().is_some() {
            return Ok(());
        }

        let file = File::open(MSR_DEVICE_PATH)?;

        // If another thread won the race, its handle is as good as ours.
        _ = self.msr_device.set(file);

        Ok(())
    }

    fn read_msr(&self, register: u32) -> io::Result<u64> {
        let file = self.msr_device.get().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                "the MSR device has not been opened",
            )
        })?;

        read_register(file, register)
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(unix)]
fn read_register(file: &File, register: u32) -> io::Result<u64> {
    use std::os::unix::fs::FileExt;

    // The msr driver maps the register address to the file offset.
    let mut buffer = [0_u8; 8];
    file.read_exact_at(&mut buffer, u64::from(register))?;

    Ok(u64::from_le_bytes(buffer))
}

#[cfg(not(unix))]
fn read_register(_file: &File, _register: u32) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "model-specific registers can only be read through the Linux msr driver",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_open_is_an_error() {
        let platform = BuildTargetPlatform::new();

        let error = platform.read_msr(0x606).unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn clock_is_after_epoch() {
        let now = BUILD_TARGET_PLATFORM.now();

        assert!(now > SystemTime::UNIX_EPOCH);
    }
}
