use crate::{CpuVendor, Domain, EnergyUnit};

/// Raw counter readings and derived energy of one domain over one measurement window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DomainReading {
    domain: Domain,
    start: u64,
    end: u64,
    joules: f64,
}

impl DomainReading {
    pub(crate) fn new(domain: Domain, start: u64, end: u64, unit: EnergyUnit) -> Self {
        Self {
            domain,
            start,
            end,
            joules: unit.joules_between(start, end),
        }
    }

    /// The domain the counter belongs to.
    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Raw counter value when the window was opened.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Raw counter value when the window was closed.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Energy consumed by the domain during the window.
    #[must_use]
    pub const fn joules(&self) -> f64 {
        self.joules
    }
}

/// The record of one closed measurement window of a RAPL probe.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergySample {
    started_at_ms: u128,
    ended_at_ms: u128,
    readings: Vec<DomainReading>,
}

impl EnergySample {
    pub(crate) fn new(
        started_at_ms: u128,
        ended_at_ms: u128,
        readings: Vec<DomainReading>,
    ) -> Self {
        Self {
            started_at_ms,
            ended_at_ms,
            readings,
        }
    }

    /// When the window was opened, in milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn started_at_ms(&self) -> u128 {
        self.started_at_ms
    }

    /// When the window was closed, in milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn ended_at_ms(&self) -> u128 {
        self.ended_at_ms
    }

    /// One reading per domain, in the vendor's domain order.
    #[must_use]
    pub fn readings(&self) -> &[DomainReading] {
        &self.readings
    }

    /// Energy consumed by `domain` during the window, if the processor exposes that domain.
    #[must_use]
    pub fn joules(&self, domain: Domain) -> Option<f64> {
        self.readings
            .iter()
            .find(|reading| reading.domain == domain)
            .map(DomainReading::joules)
    }

    /// The fields of the sample's CSV record, in the column order of [`csv_header()`].
    pub(crate) fn csv_record(&self) -> Vec<String> {
        [self.started_at_ms, self.ended_at_ms]
            .iter()
            .map(u128::to_string)
            .chain(
                self.readings
                    .iter()
                    .flat_map(|reading| [reading.start.to_string(), reading.end.to_string()]),
            )
            .collect()
    }
}

/// The CSV column names for samples of `vendor`.
pub(crate) fn csv_header(vendor: CpuVendor) -> Vec<String> {
    let mut header = vec!["TimeStart".to_string(), "TimeEnd".to_string()];

    for (domain, _) in vendor.domains() {
        header.push(format!("{domain}Start"));
        header.push(format!("{domain}End"));
    }

    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amd_sample() -> EnergySample {
        let unit = EnergyUnit::from_power_unit_register(0x0000_0100);

        EnergySample::new(
            1_700_000_000_000,
            1_700_000_000_250,
            vec![
                DomainReading::new(Domain::Core, 10, 30, unit),
                DomainReading::new(Domain::Package, 100, 180, unit),
            ],
        )
    }

    #[test]
    fn intel_header() {
        assert_eq!(
            csv_header(CpuVendor::Intel),
            [
                "TimeStart", "TimeEnd", "PP0Start", "PP0End", "PP1Start", "PP1End", "PkgStart",
                "PkgEnd", "DramStart", "DramEnd",
            ]
        );
    }

    #[test]
    fn amd_header() {
        assert_eq!(
            csv_header(CpuVendor::Amd),
            [
                "TimeStart", "TimeEnd", "CoreStart", "CoreEnd", "PkgStart", "PkgEnd",
            ]
        );
    }

    #[test]
    fn record_follows_header_order() {
        let record = amd_sample().csv_record();

        assert_eq!(record.len(), csv_header(CpuVendor::Amd).len());
        assert_eq!(
            record,
            ["1700000000000", "1700000000250", "10", "30", "100", "180"]
        );
    }

    #[test]
    fn joules_per_domain() {
        let sample = amd_sample();

        // ESU 1: half a joule per count.
        assert_eq!(sample.joules(Domain::Core), Some(10.0));
        assert_eq!(sample.joules(Domain::Package), Some(40.0));
        assert_eq!(sample.joules(Domain::Dram), None);
    }
}
