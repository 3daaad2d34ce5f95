use derive_more::Display;

/// A RAPL power domain: a part of the processor package whose energy consumption has its
/// own counter.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Domain {
    /// The whole processor package.
    #[display("Pkg")]
    Package,

    /// Power plane 0: the processor cores (Intel).
    #[display("PP0")]
    Pp0,

    /// Power plane 1: typically the integrated graphics (Intel).
    #[display("PP1")]
    Pp1,

    /// Memory attached to the package (Intel).
    #[display("Dram")]
    Dram,

    /// The processor cores (AMD).
    #[display("Core")]
    Core,
}

/// A processor vendor with a known RAPL register layout.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CpuVendor {
    /// `GenuineIntel`.
    #[display("Intel")]
    Intel,

    /// `AuthenticAMD`.
    #[display("AMD")]
    Amd,
}

const INTEL_DOMAINS: &[(Domain, u32)] = &[
    (Domain::Pp0, 0x639),
    (Domain::Pp1, 0x641),
    (Domain::Package, 0x611),
    (Domain::Dram, 0x619),
];

const AMD_DOMAINS: &[(Domain, u32)] = &[
    (Domain::Core, 0xC001_029A),
    (Domain::Package, 0xC001_029B),
];

impl CpuVendor {
    /// Identifies the vendor from the `vendor_id` field of `/proc/cpuinfo` text.
    ///
    /// Returns the vendor string that was found (if any) as the error when the vendor is
    /// not one with a known RAPL layout.
    pub(crate) fn from_cpu_info(cpu_info: &str) -> Result<Self, String> {
        let vendor_id = cpu_info
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim() == "vendor_id")
            .map(|(_, value)| value.trim())
            .unwrap_or_default();

        match vendor_id {
            "GenuineIntel" => Ok(Self::Intel),
            "AuthenticAMD" => Ok(Self::Amd),
            other => Err(other.to_string()),
        }
    }

    /// Address of the register that holds the power, energy and time units.
    #[must_use]
    pub const fn power_unit_register(self) -> u32 {
        match self {
            Self::Intel => 0x606,
            Self::Amd => 0xC001_0299,
        }
    }

    /// The domains this vendor exposes, with the address of each energy status register.
    ///
    /// The order is stable and is the order of columns in sample files.
    #[must_use]
    pub fn domains(self) -> &'static [(Domain, u32)] {
        match self {
            Self::Intel => INTEL_DOMAINS,
            Self::Amd => AMD_DOMAINS,
        }
    }
}
