use std::fmt::Debug;
use std::io;
#[cfg(test)]
use std::sync::Arc;
use std::time::SystemTime;

#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform};

#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Real(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) const fn real() -> Self {
        Self::Real(&BUILD_TARGET_PLATFORM)
    }
}

#[cfg_attr(test, mutants::skip)] // Trivial forwarders.
impl Platform for PlatformFacade {
    fn cpu_info(&self) -> io::Result<String> {
        match self {
            Self::Real(platform) => platform.cpu_info(),
            #[cfg(test)]
            Self::Mock(platform) => platform.cpu_info(),
        }
    }

    fn open_msr_device(&self) -> io::Result<()> {
        match self {
            Self::Real(platform) => platform.open_msr_device(),
            #[cfg(test)]
            Self::Mock(platform) => platform.open_msr_device(),
        }
    }

    fn read_msr(&self, register: u32) -> io::Result<u64> {
        match self {
            Self::Real(platform) => platform.read_msr(register),
            #[cfg(test)]
            Self::Mock(platform) => platform.read_msr(register),
        }
    }

    fn now(&self) -> SystemTime {
        match self {
            Self::Real(platform) => platform.now(),
            #[cfg(test)]
            Self::Mock(platform) => platform.now(),
        }
    }
}

#[cfg(test)]
impl From<MockPlatform> for PlatformFacade {
    fn from(platform: MockPlatform) -> Self {
        Self::Mock(Arc::new(platform))
    }
}

impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(platform) => platform.fmt(f),
            #[cfg(test)]
            Self::Mock(platform) => platform.fmt(f),
        }
    }
}
