use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

use energy_harness::{EnergyProbe, ProbeSignal};
use tracing::{debug, error, info, warn};

use crate::pal::{MSR_DEVICE_PATH, Platform, PlatformFacade};
use crate::{
    CpuVendor, DomainReading, EnergySample, EnergyUnit, Error, MeasurementBudget, Result,
    SampleDestination, SampleFile,
};

/// Set while a [`RaplProbe`] exists in this process.
static RAPL_PROBE_OPEN: AtomicBool = AtomicBool::new(false);

/// How a [`RaplProbe`] should behave.
#[derive(Clone, Debug, Default)]
pub struct RaplOptions {
    budget: MeasurementBudget,
    samples: SampleDestination,
}

impl RaplOptions {
    /// Unlimited budget, samples appended to the default file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many measurement windows the probe opens before it signals stop.
    #[must_use]
    pub fn budget(mut self, budget: MeasurementBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets where samples are written.
    #[must_use]
    pub fn samples(mut self, samples: SampleDestination) -> Self {
        self.samples = samples;
        self
    }
}

/// Releases the process-wide RAPL claim when dropped.
#[derive(Debug)]
struct Claim(&'static AtomicBool);

impl Claim {
    fn acquire(flag: &'static AtomicBool) -> Result<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyOpen);
        }

        Ok(Self(flag))
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct OpenWindow {
    started_at_ms: u128,
    counters: Vec<u64>,
}

/// Measures the energy of each measurement window with the processor's RAPL counters.
///
/// The counters are read from model-specific registers through the Linux `msr` driver, which
/// usually requires root privileges. Each closed window becomes an [`EnergySample`], which is
/// kept in memory and appended to a CSV file.
///
/// Only one `RaplProbe` can exist in a process at a time, as the counters are a shared
/// machine-wide resource and interleaved windows would measure each other.
///
/// # Examples
///
/// ```no_run
/// use energy_probe::{MeasurementBudget, RaplOptions, RaplProbe};
///
/// let probe = RaplProbe::open(RaplOptions::new().budget(MeasurementBudget::limited(10)))?;
///
/// println!("energy counters of a {} processor", probe.vendor());
/// # Ok::<(), energy_probe::Error>(())
/// ```
#[derive(Debug)]
pub struct RaplProbe {
    platform: PlatformFacade,
    vendor: CpuVendor,
    unit: EnergyUnit,
    power_unit_raw: u64,
    budget: MeasurementBudget,
    open_window: Option<OpenWindow>,
    samples: Vec<EnergySample>,
    sample_file: Option<SampleFile>,

    _claim: Claim,
}

impl RaplProbe {
    /// Opens the RAPL counters of this machine.
    ///
    /// # Errors
    ///
    /// Fails if another `RaplProbe` is open in this process, if the processor vendor has no
    /// supported RAPL interface, if the MSR device cannot be opened or read, or if the sample
    /// file cannot be opened.
    #[cfg_attr(test, mutants::skip)] // Requires RAPL hardware and root privileges.
    pub fn open(options: RaplOptions) -> Result<Self> {
        Self::open_on(PlatformFacade::real(), options, &RAPL_PROBE_OPEN)
    }

    fn open_on(
        platform: PlatformFacade,
        options: RaplOptions,
        claim_flag: &'static AtomicBool,
    ) -> Result<Self> {
        let claim = Claim::acquire(claim_flag)?;

        let cpu_info = platform.cpu_info().map_err(Error::CpuInfo)?;
        let vendor = CpuVendor::from_cpu_info(&cpu_info)
            .map_err(|vendor_id| Error::UnsupportedVendor { vendor_id })?;

        platform
            .open_msr_device()
            .map_err(|source| Error::MsrDevice {
                path: MSR_DEVICE_PATH,
                source,
            })?;

        let register = vendor.power_unit_register();
        let power_unit_raw = platform
            .read_msr(register)
            .map_err(|source| Error::RegisterRead { register, source })?;
        let unit = EnergyUnit::from_power_unit_register(power_unit_raw);

        let sample_file = options
            .samples
            .resolve(vendor, power_unit_raw)
            .map(|path| {
                SampleFile::open(path.clone(), vendor)
                    .map_err(|source| Error::SampleFile { path, source })
            })
            .transpose()?;

        info!(
            %vendor,
            energy_status_unit = unit.energy_status_unit(),
            budget = ?options.budget.limit(),
            sample_file = ?sample_file.as_ref().map(SampleFile::path),
            "RAPL probe opened"
        );

        Ok(Self {
            platform,
            vendor,
            unit,
            power_unit_raw,
            budget: options.budget,
            open_window: None,
            samples: Vec::new(),
            sample_file,
            _claim: claim,
        })
    }

    /// The processor vendor whose register layout is being read.
    #[must_use]
    pub fn vendor(&self) -> CpuVendor {
        self.vendor
    }

    /// The energy unit decoded from the power unit register.
    #[must_use]
    pub fn energy_unit(&self) -> EnergyUnit {
        self.unit
    }

    /// The raw value of the power unit register, as read when the probe was opened.
    #[must_use]
    pub fn power_unit_raw(&self) -> u64 {
        self.power_unit_raw
    }

    /// The measurement budget and how much of it has been used.
    #[must_use]
    pub fn budget(&self) -> &MeasurementBudget {
        &self.budget
    }

    /// Samples of all windows closed so far, oldest first.
    #[must_use]
    pub fn samples(&self) -> &[EnergySample] {
        &self.samples
    }

    /// Releases the counters and returns the samples of all closed windows.
    #[must_use]
    pub fn into_samples(self) -> Vec<EnergySample> {
        self.samples
    }

    fn read_counters(&self) -> Result<Vec<u64>> {
        self.vendor
            .domains()
            .iter()
            .map(|&(_, register)| {
                self.platform
                    .read_msr(register)
                    .map_err(|source| Error::RegisterRead { register, source })
            })
            .collect()
    }

    fn now_ms(&self) -> u128 {
        self.platform
            .now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }
}

impl EnergyProbe for RaplProbe {
    fn begin_measurement(&mut self) -> ProbeSignal {
        assert!(
            self.open_window.is_none(),
            "begin_measurement() called while a measurement window is already open"
        );

        if self.budget.is_exhausted() {
            info!(
                windows = self.budget.opened(),
                "measurement budget exhausted"
            );
            return ProbeSignal::Stop;
        }

        let started_at_ms = self.now_ms();

        let counters = match self.read_counters() {
            Ok(counters) => counters,
            Err(e) => {
                error!(error = %e, "cannot read energy counters, stopping the run");
                return ProbeSignal::Stop;
            }
        };

        self.budget.record_opened();
        self.open_window = Some(OpenWindow {
            started_at_ms,
            counters,
        });

        ProbeSignal::Continue
    }

    fn end_measurement(&mut self) {
        let window = self
            .open_window
            .take()
            .expect("end_measurement() called without an open measurement window");

        let counters = match self.read_counters() {
            Ok(counters) => counters,
            Err(e) => {
                warn!(error = %e, "cannot read energy counters, dropping the sample");
                return;
            }
        };

        let ended_at_ms = self.now_ms();

        let readings = self
            .vendor
            .domains()
            .iter()
            .zip(window.counters.iter().zip(counters))
            .map(|(&(domain, _), (&start, end))| DomainReading::new(domain, start, end, self.unit))
            .collect();

        let sample = EnergySample::new(window.started_at_ms, ended_at_ms, readings);

        debug!(
            duration_ms = ended_at_ms.saturating_sub(window.started_at_ms),
            readings = ?sample.readings(),
            "measurement window closed"
        );

        if let Some(file) = &mut self.sample_file {
            if let Err(e) = file.append(&sample) {
                error!(error = %e, path = %file.path().display(), "cannot append energy sample");
            }
        }

        self.samples.push(sample);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use std::sync::atomic::AtomicU64;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime};

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::Domain;
    use crate::pal::MockPlatform;

    assert_impl_all!(RaplProbe: Send, Sync);

    const INTEL_POWER_UNIT: u64 = 0x000A_0E03;

    fn epoch_plus_ms(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    /// Register values and clock shared between a test and its mock platform.
    #[derive(Clone, Default)]
    struct Machine {
        registers: Arc<Mutex<HashMap<u32, u64>>>,
        clock_ms: Arc<AtomicU64>,
        fail_reads: Arc<AtomicBool>,
    }

    impl Machine {
        fn set(&self, register: u32, value: u64) {
            self.registers.lock().unwrap().insert(register, value);
        }

        fn advance_clock(&self, ms: u64) {
            self.clock_ms.fetch_add(ms, Ordering::Relaxed);
        }

        fn platform(&self, vendor_id: &'static str) -> PlatformFacade {
            let mut platform = MockPlatform::new();

            platform
                .expect_cpu_info()
                .returning(move || Ok(format!("processor\t: 0\nvendor_id\t: {vendor_id}\n")));
            platform.expect_open_msr_device().returning(|| Ok(()));

            let machine = self.clone();
            platform.expect_read_msr().returning(move |register| {
                if machine.fail_reads.load(Ordering::Relaxed) {
                    return Err(io::Error::other("read failed"));
                }

                Ok(machine
                    .registers
                    .lock()
                    .unwrap()
                    .get(&register)
                    .copied()
                    .unwrap_or_default())
            });

            let clock = Arc::clone(&self.clock_ms);
            platform
                .expect_now()
                .returning(move || epoch_plus_ms(clock.load(Ordering::Relaxed)));

            platform.into()
        }
    }

    fn intel_machine() -> Machine {
        let machine = Machine::default();
        machine.set(0x606, INTEL_POWER_UNIT);
        machine.clock_ms.store(1_000, Ordering::Relaxed);
        machine
    }

    fn fresh_claim() -> &'static AtomicBool {
        Box::leak(Box::new(AtomicBool::new(false)))
    }

    fn memory_only() -> RaplOptions {
        RaplOptions::new().samples(SampleDestination::MemoryOnly)
    }

    fn open_intel(machine: &Machine) -> RaplProbe {
        let platform = machine.platform("GenuineIntel");
        RaplProbe::open_on(platform, memory_only(), fresh_claim()).unwrap()
    }

    #[test]
    fn measures_one_window() {
        let machine = intel_machine();
        let mut probe = open_intel(&machine);

        assert_eq!(probe.vendor(), CpuVendor::Intel);
        assert_eq!(probe.energy_unit().energy_status_unit(), 14);

        machine.set(0x611, 1_000);
        assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);

        machine.set(0x611, 1_000 + 16_384);
        machine.advance_clock(250);
        probe.end_measurement();

        let samples = probe.into_samples();
        assert_eq!(samples.len(), 1);

        let sample = samples.first().unwrap();
        assert_eq!(sample.started_at_ms(), 1_000);
        assert_eq!(sample.ended_at_ms(), 1_250);
        assert_eq!(sample.readings().len(), 4);
        assert_eq!(sample.joules(Domain::Package), Some(1.0));
        assert_eq!(sample.joules(Domain::Dram), Some(0.0));
    }

    #[test]
    fn counter_wrap_is_handled() {
        let machine = intel_machine();
        let mut probe = open_intel(&machine);

        machine.set(0x639, 0xFFFF_C000);
        assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);
        machine.set(0x639, 0x0000_4000);
        probe.end_measurement();

        // 0x8000 counts at 2^-14 J each.
        let sample = probe.samples().first().unwrap();
        assert_eq!(sample.joules(Domain::Pp0), Some(2.0));
    }

    #[test]
    fn budget_stops_without_opening_a_window() {
        let machine = intel_machine();
        let options = memory_only().budget(MeasurementBudget::limited(2));
        let mut probe =
            RaplProbe::open_on(machine.platform("GenuineIntel"), options, fresh_claim()).unwrap();

        for _ in 0..2 {
            assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);
            probe.end_measurement();
        }

        assert_eq!(probe.begin_measurement(), ProbeSignal::Stop);
        assert_eq!(probe.budget().opened(), 2);
        assert_eq!(probe.samples().len(), 2);

        // No window is open, so a further begin is not a usage error.
        assert_eq!(probe.begin_measurement(), ProbeSignal::Stop);
    }

    #[test]
    fn read_failure_on_begin_stops() {
        let machine = intel_machine();
        let mut probe = open_intel(&machine);

        machine.fail_reads.store(true, Ordering::Relaxed);

        assert_eq!(probe.begin_measurement(), ProbeSignal::Stop);
        assert_eq!(probe.budget().opened(), 0);
    }

    #[test]
    fn read_failure_on_end_drops_sample() {
        let machine = intel_machine();
        let mut probe = open_intel(&machine);

        assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);
        machine.fail_reads.store(true, Ordering::Relaxed);
        probe.end_measurement();

        assert!(probe.samples().is_empty());

        // The window is closed even though the sample was lost.
        machine.fail_reads.store(false, Ordering::Relaxed);
        assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);
    }

    #[test]
    #[should_panic]
    fn nested_begin_panics() {
        let machine = intel_machine();
        let mut probe = open_intel(&machine);

        _ = probe.begin_measurement();
        _ = probe.begin_measurement();
    }

    #[test]
    #[should_panic]
    fn end_without_begin_panics() {
        let machine = intel_machine();
        let mut probe = open_intel(&machine);

        probe.end_measurement();
    }

    #[test]
    fn second_probe_is_rejected_until_first_is_dropped() {
        let machine = intel_machine();
        let claim = fresh_claim();

        let first = RaplProbe::open_on(machine.platform("GenuineIntel"), memory_only(), claim)
            .unwrap();

        let second = RaplProbe::open_on(machine.platform("GenuineIntel"), memory_only(), claim);
        assert!(matches!(second, Err(Error::AlreadyOpen)));

        drop(first);

        RaplProbe::open_on(machine.platform("GenuineIntel"), memory_only(), claim).unwrap();
    }

    #[test]
    fn unsupported_vendor_releases_claim() {
        let machine = intel_machine();
        let claim = fresh_claim();

        let result = RaplProbe::open_on(machine.platform("CentaurHauls"), memory_only(), claim);
        assert!(matches!(
            result,
            Err(Error::UnsupportedVendor { ref vendor_id }) if vendor_id == "CentaurHauls"
        ));

        assert!(!claim.load(Ordering::Acquire));
    }

    #[test]
    fn msr_device_failure_is_reported() {
        let mut platform = MockPlatform::new();
        platform
            .expect_cpu_info()
            .returning(|| Ok("vendor_id : AuthenticAMD\n".to_string()));
        platform
            .expect_open_msr_device()
            .returning(|| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let result = RaplProbe::open_on(platform.into(), memory_only(), fresh_claim());

        assert!(matches!(result, Err(Error::MsrDevice { .. })));
    }

    #[test]
    fn amd_samples_go_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amd.csv");

        let machine = Machine::default();
        machine.set(0xC001_0299, 0x0000_1000);

        let options = RaplOptions::new().samples(SampleDestination::File(path.clone()));
        let mut probe =
            RaplProbe::open_on(machine.platform("AuthenticAMD"), options, fresh_claim()).unwrap();

        machine.set(0xC001_029A, 5);
        machine.set(0xC001_029B, 7);
        assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);
        machine.set(0xC001_029A, 15);
        machine.set(0xC001_029B, 27);
        machine.advance_clock(3);
        probe.end_measurement();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "TimeStart,TimeEnd,CoreStart,CoreEnd,PkgStart,PkgEnd\n0,3,5,15,7,27\n"
        );
    }
}
