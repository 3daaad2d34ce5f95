use std::fmt::Debug;

/// Tells the caller of [`EnergyProbe::begin_measurement()`] whether a measurement window was
/// opened or whether the measurement session is over.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the two-valued signal is the whole point of the type, it will never grow"
)]
pub enum ProbeSignal {
    /// A measurement window is now open and must be closed with
    /// [`EnergyProbe::end_measurement()`].
    #[display("continue")]
    Continue,

    /// The energy accounting subsystem has collected enough data. No window was opened and no
    /// further measurement windows may be opened in this session.
    #[display("stop")]
    Stop,
}

/// Brackets a span of work with hardware energy accounting.
///
/// Implementations forward to some process-wide accounting facility (RAPL registers or an
/// equivalent). At most one window may be open at a time.
///
/// Callers are expected to go through [`MeasurementWindow`], which guarantees that every opened
/// window is closed exactly once, instead of calling these methods directly.
pub trait EnergyProbe: Debug {
    /// Starts energy accounting for a new measurement window.
    ///
    /// Returns [`ProbeSignal::Continue`] if a window was opened. Returns [`ProbeSignal::Stop`]
    /// without opening a window if the session should end. `Stop` is authoritative.
    ///
    /// # Panics
    ///
    /// Implementations may panic if a window is already open.
    fn begin_measurement(&mut self) -> ProbeSignal;

    /// Stops energy accounting for the currently open window.
    ///
    /// # Panics
    ///
    /// Implementations may panic if no window is open. This is a programming error.
    fn end_measurement(&mut self);
}

impl<P> EnergyProbe for &mut P
where
    P: EnergyProbe + ?Sized,
{
    fn begin_measurement(&mut self) -> ProbeSignal {
        (**self).begin_measurement()
    }

    fn end_measurement(&mut self) {
        (**self).end_measurement();
    }
}

impl<P> EnergyProbe for Box<P>
where
    P: EnergyProbe + ?Sized,
{
    fn begin_measurement(&mut self) -> ProbeSignal {
        (**self).begin_measurement()
    }

    fn end_measurement(&mut self) {
        (**self).end_measurement();
    }
}

/// An open measurement window on an [`EnergyProbe`].
///
/// The window is closed when the value is dropped or when [`close()`][Self::close] is called,
/// whichever comes first, so a window opened before a payload executes is closed on every exit
/// path, including unwinding out of a panicking payload.
///
/// # Examples
///
/// ```
/// use energy_harness::{EnergyProbe, MeasurementWindow, ProbeSignal};
///
/// #[derive(Debug, Default)]
/// struct CountingProbe {
///     open: bool,
///     closed: usize,
/// }
///
/// impl EnergyProbe for CountingProbe {
///     fn begin_measurement(&mut self) -> ProbeSignal {
///         self.open = true;
///         ProbeSignal::Continue
///     }
///
///     fn end_measurement(&mut self) {
///         assert!(self.open);
///         self.open = false;
///         self.closed += 1;
///     }
/// }
///
/// let mut probe = CountingProbe::default();
///
/// {
///     let _window = MeasurementWindow::open(&mut probe).expect("probe never stops");
///     // Measured work goes here.
/// }
///
/// assert_eq!(probe.closed, 1);
/// ```
#[derive(Debug)]
#[must_use = "the window is closed as soon as it is dropped"]
pub struct MeasurementWindow<'p, P>
where
    P: EnergyProbe + ?Sized,
{
    probe: &'p mut P,
}

impl<'p, P> MeasurementWindow<'p, P>
where
    P: EnergyProbe + ?Sized,
{
    /// Asks the probe to open a window.
    ///
    /// Returns `None` if the probe signalled [`ProbeSignal::Stop`], in which case no window exists
    /// and nothing needs to be closed.
    pub fn open(probe: &'p mut P) -> Option<Self> {
        match probe.begin_measurement() {
            ProbeSignal::Continue => Some(Self { probe }),
            ProbeSignal::Stop => None,
        }
    }

    /// Closes the window now instead of waiting for it to be dropped.
    pub fn close(self) {
        drop(self);
    }
}

impl<P> Drop for MeasurementWindow<'_, P>
where
    P: EnergyProbe + ?Sized,
{
    fn drop(&mut self) {
        self.probe.end_measurement();
    }
}
