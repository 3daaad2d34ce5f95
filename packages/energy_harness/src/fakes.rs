//! Scriptable test doubles for the harness contracts.
//!
//! Available in this package's own tests and, through the `fakes` feature, to dependent packages.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{EnergyProbe, ExecuteError, Payload, PrepareError, ProbeSignal};

/// A call observed by a [`RecordingProbe`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "test helper, not a stable API")]
pub enum ProbeEvent {
    /// `begin_measurement()` opened a window.
    Begin,

    /// `end_measurement()` closed the open window.
    End,

    /// `begin_measurement()` signalled stop without opening a window.
    StopSignalled,
}

/// Shared view of whether a [`RecordingProbe`] currently has a window open.
#[derive(Clone, Debug, Default)]
pub struct WindowFlag(Arc<AtomicBool>);

impl WindowFlag {
    /// Whether the probe this flag was taken from has a window open right now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}

/// An [`EnergyProbe`] that records every call and can be told when to signal stop.
///
/// Overlapping windows and closing a window that is not open are usage errors and panic, the
/// same as for a real probe.
#[derive(Debug, Default)]
pub struct RecordingProbe {
    events: Vec<ProbeEvent>,
    begin_calls: u64,
    stop_on_call: Option<u64>,
    window: WindowFlag,
}

impl RecordingProbe {
    /// Creates a probe that never signals stop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a probe that signals stop on the `call`-th `begin_measurement()` (1-based) and
    /// every call after it.
    #[must_use]
    pub fn stopping_on_call(call: u64) -> Self {
        Self {
            stop_on_call: Some(call),
            ..Self::default()
        }
    }

    /// Every call observed so far, in order.
    #[must_use]
    pub fn events(&self) -> &[ProbeEvent] {
        &self.events
    }

    /// How many windows were opened.
    #[must_use]
    pub fn begin_count(&self) -> usize {
        self.count(ProbeEvent::Begin)
    }

    /// How many windows were closed.
    #[must_use]
    pub fn end_count(&self) -> usize {
        self.count(ProbeEvent::End)
    }

    /// Whether a window is open right now.
    #[must_use]
    pub fn is_window_open(&self) -> bool {
        self.window.is_open()
    }

    /// A handle that payloads can use to observe whether they execute inside a window.
    #[must_use]
    pub fn window_flag(&self) -> WindowFlag {
        self.window.clone()
    }

    /// Whether opened and closed windows strictly alternate, starting with an open and ending
    /// with a close.
    #[must_use]
    pub fn is_strictly_alternating(&self) -> bool {
        let brackets: Vec<_> = self
            .events
            .iter()
            .filter(|event| **event != ProbeEvent::StopSignalled)
            .collect();

        brackets.len() % 2 == 0
            && brackets
                .chunks(2)
                .all(|pair| matches!(pair, [ProbeEvent::Begin, ProbeEvent::End]))
    }

    fn count(&self, kind: ProbeEvent) -> usize {
        self.events.iter().filter(|event| **event == kind).count()
    }
}

impl EnergyProbe for RecordingProbe {
    fn begin_measurement(&mut self) -> ProbeSignal {
        assert!(
            !self.window.is_open(),
            "begin_measurement() called while a window is already open"
        );

        self.begin_calls = self
            .begin_calls
            .checked_add(1)
            .expect("test probes never see u64::MAX calls");

        if self
            .stop_on_call
            .is_some_and(|stop_on| self.begin_calls >= stop_on)
        {
            self.events.push(ProbeEvent::StopSignalled);
            return ProbeSignal::Stop;
        }

        self.window.set(true);
        self.events.push(ProbeEvent::Begin);
        ProbeSignal::Continue
    }

    fn end_measurement(&mut self) {
        assert!(
            self.window.is_open(),
            "end_measurement() called with no open window"
        );

        self.window.set(false);
        self.events.push(ProbeEvent::End);
    }
}

/// A lifecycle call observed by a [`ScriptedPayload`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "test helper, not a stable API")]
pub enum PayloadEvent {
    /// `prepare()` succeeded.
    Prepare,

    /// `execute()` was called, whether it succeeded or not.
    Execute,

    /// `teardown()` was called.
    Teardown,
}

/// Shared record of the lifecycle calls of a [`ScriptedPayload`].
///
/// Stays readable after the payload itself has been moved away or dropped.
#[derive(Clone, Debug, Default)]
pub struct LifecycleLog(Arc<Mutex<Vec<PayloadEvent>>>);

impl LifecycleLog {
    /// Every lifecycle call observed so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<PayloadEvent> {
        self.0
            .lock()
            .expect("lifecycle log lock is never poisoned")
            .clone()
    }

    /// How many calls of the given kind were observed.
    #[must_use]
    pub fn count(&self, kind: PayloadEvent) -> usize {
        self.0
            .lock()
            .expect("lifecycle log lock is never poisoned")
            .iter()
            .filter(|event| **event == kind)
            .count()
    }

    /// Records a lifecycle call. [`ScriptedPayload`] does this itself; hand-written payloads in
    /// tests can share a log the same way.
    pub fn record(&self, event: PayloadEvent) {
        self.0
            .lock()
            .expect("lifecycle log lock is never poisoned")
            .push(event);
    }
}

/// State handed out by [`ScriptedPayload::prepare()`].
#[derive(Debug)]
pub struct ScriptedState {
    generation: u64,
}

/// A [`Payload`] with scripted results and failures that records its lifecycle.
///
/// Execution ordinals count every `execute()` call, warm-up and measured alike, starting at 0.
/// Execution `i` returns the `i`-th scripted value, or `i` itself once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedPayload {
    script: Vec<u64>,
    failing_executions: HashSet<u64>,
    failing_prepare_call: Option<u64>,

    lifecycle: LifecycleLog,
    executions: u64,
    prepare_calls: u64,
    live_generation: Option<u64>,

    observed_window: Option<WindowFlag>,
    window_open_during_execute: Vec<bool>,
}

impl ScriptedPayload {
    /// Creates a payload whose executions return their own ordinal.
    #[must_use]
    pub fn counting() -> Self {
        Self::default()
    }

    /// Creates a payload whose executions return the given values in order.
    #[must_use]
    pub fn returning(script: impl IntoIterator<Item = u64>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Makes the execution with the given ordinal fail.
    #[must_use]
    pub fn failing_on_execution(mut self, execution: u64) -> Self {
        self.failing_executions.insert(execution);
        self
    }

    /// Makes the `call`-th `prepare()` (1-based) fail with an allocation failure.
    #[must_use]
    pub fn failing_prepare_on_call(mut self, call: u64) -> Self {
        self.failing_prepare_call = Some(call);
        self
    }

    /// Records, for every execution, whether the given window was open at the time.
    #[must_use]
    pub fn observing(mut self, window: WindowFlag) -> Self {
        self.observed_window = Some(window);
        self
    }

    /// Every lifecycle call observed so far, in order.
    #[must_use]
    pub fn lifecycle(&self) -> Vec<PayloadEvent> {
        self.lifecycle.events()
    }

    /// A handle to the lifecycle record that outlives the payload.
    #[must_use]
    pub fn lifecycle_log(&self) -> LifecycleLog {
        self.lifecycle.clone()
    }

    /// How many times `execute()` was called.
    #[must_use]
    pub fn execute_count(&self) -> usize {
        self.count(PayloadEvent::Execute)
    }

    /// How many times `prepare()` succeeded.
    #[must_use]
    pub fn prepare_count(&self) -> usize {
        self.count(PayloadEvent::Prepare)
    }

    /// How many times `teardown()` was called.
    #[must_use]
    pub fn teardown_count(&self) -> usize {
        self.count(PayloadEvent::Teardown)
    }

    /// For every execution, whether the observed window was open. Empty unless
    /// [`observing()`][Self::observing] was used.
    #[must_use]
    pub fn window_open_during_execute(&self) -> &[bool] {
        &self.window_open_during_execute
    }

    fn count(&self, kind: PayloadEvent) -> usize {
        self.lifecycle.count(kind)
    }
}

impl Payload for ScriptedPayload {
    type State = ScriptedState;
    type Output = u64;

    fn prepare(&mut self) -> Result<Self::State, PrepareError> {
        self.prepare_calls = self
            .prepare_calls
            .checked_add(1)
            .expect("test payloads never see u64::MAX calls");

        if self.failing_prepare_call == Some(self.prepare_calls) {
            return Err(PrepareError::allocation_failure(
                "scripted",
                format!("prepare call {} scripted to fail", self.prepare_calls),
            ));
        }

        assert!(
            self.live_generation.is_none(),
            "prepare() called while previously prepared state is still live"
        );

        self.live_generation = Some(self.prepare_calls);
        self.lifecycle.record(PayloadEvent::Prepare);

        Ok(ScriptedState {
            generation: self.prepare_calls,
        })
    }

    fn execute(&mut self, state: &mut Self::State) -> Result<Self::Output, ExecuteError> {
        assert_eq!(
            self.live_generation,
            Some(state.generation),
            "execute() called with stale state"
        );

        let execution = self.executions;
        self.executions = execution
            .checked_add(1)
            .expect("test payloads never see u64::MAX calls");

        self.lifecycle.record(PayloadEvent::Execute);

        if let Some(window) = &self.observed_window {
            self.window_open_during_execute.push(window.is_open());
        }

        if self.failing_executions.contains(&execution) {
            return Err(ExecuteError::new(format!("execution {execution} scripted to fail")));
        }

        let index = usize::try_from(execution).expect("test scripts fit in memory");
        Ok(self.script.get(index).copied().unwrap_or(execution))
    }

    fn teardown(&mut self, state: Self::State) {
        assert_eq!(
            self.live_generation.take(),
            Some(state.generation),
            "teardown() called with state that is not the live one"
        );

        self.lifecycle.record(PayloadEvent::Teardown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_stops_from_configured_call_onwards() {
        let mut probe = RecordingProbe::stopping_on_call(2);

        assert_eq!(probe.begin_measurement(), ProbeSignal::Continue);
        probe.end_measurement();
        assert_eq!(probe.begin_measurement(), ProbeSignal::Stop);
        assert_eq!(probe.begin_measurement(), ProbeSignal::Stop);

        assert_eq!(
            probe.events(),
            [
                ProbeEvent::Begin,
                ProbeEvent::End,
                ProbeEvent::StopSignalled,
                ProbeEvent::StopSignalled,
            ]
        );
        assert!(probe.is_strictly_alternating());
    }

    #[test]
    #[should_panic(expected = "already open")]
    fn probe_rejects_overlapping_windows() {
        let mut probe = RecordingProbe::new();
        probe.begin_measurement();
        probe.begin_measurement();
    }

    #[test]
    #[should_panic(expected = "no open window")]
    fn probe_rejects_end_without_begin() {
        let mut probe = RecordingProbe::new();
        probe.end_measurement();
    }

    #[test]
    fn payload_follows_script_then_counts() {
        let mut payload = ScriptedPayload::returning([7, 8]);
        let mut state = payload.prepare().unwrap();

        let results: Vec<_> = (0..3)
            .map(|_| payload.execute(&mut state).unwrap())
            .collect();
        payload.teardown(state);

        assert_eq!(results, [7, 8, 2]);
    }

    #[test]
    fn payload_fails_where_scripted() {
        let mut payload = ScriptedPayload::counting().failing_on_execution(1);
        let mut state = payload.prepare().unwrap();

        assert!(payload.execute(&mut state).is_ok());
        assert!(payload.execute(&mut state).is_err());
        assert!(payload.execute(&mut state).is_ok());
    }

    #[test]
    fn payload_prepare_failure() {
        let mut payload = ScriptedPayload::counting().failing_prepare_on_call(1);

        let error = payload.prepare().unwrap_err();
        assert_eq!(error.payload(), "scripted");
        assert_eq!(payload.prepare_count(), 0);
    }

    #[test]
    #[should_panic(expected = "still live")]
    fn payload_rejects_double_prepare() {
        let mut payload = ScriptedPayload::counting();
        let _first = payload.prepare().unwrap();
        let _second = payload.prepare();
    }
}
