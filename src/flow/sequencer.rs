use std::{mem, sync::Arc, time::Duration};

use tracing::{debug, info, instrument, warn};

use crate::{
    device::{Device, DeviceCatalog},
    flow::{
        ConnectionState, FlowEvent, FlowSnapshot, Phase, Timings,
        selection::{Selection, SelectionHandler, SelectionPolicy},
    },
};

/// Share of `duration` covered by `elapsed`, in whole percent and capped at 100.
fn percent(elapsed: Duration, duration: Duration) -> u8 {
    if duration.is_zero() {
        return 100;
    }
    let pct = elapsed.as_nanos().saturating_mul(100) / duration.as_nanos();
    pct.min(100) as u8
}

/// Drives one connection flow through its states.
///
/// Time only moves through [`StepSequencer::tick`], so the same sequencer runs under a real
/// timer or a simulated one. Events produced by any operation are collected until
/// [`StepSequencer::take_events`] is called.
#[derive(Debug)]
pub struct StepSequencer {
    catalog: Arc<DeviceCatalog>,
    timings: Timings,
    policy: SelectionPolicy,
    dashboard_route: String,
    state: ConnectionState,
    elapsed: Duration,
    finished: bool,
    events: Vec<FlowEvent>,
}

impl StepSequencer {
    pub fn new(
        catalog: Arc<DeviceCatalog>,
        timings: Timings,
        policy: SelectionPolicy,
        dashboard_route: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            timings,
            policy,
            dashboard_route: dashboard_route.into(),
            state: ConnectionState::Idle,
            elapsed: Duration::ZERO,
            finished: false,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn catalog(&self) -> &Arc<DeviceCatalog> {
        &self.catalog
    }

    /// True once the dashboard redirect has been issued.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True while the current state advances on its own and needs ticks.
    pub fn is_timed(&self) -> bool {
        !self.finished
            && matches!(
                self.phase(),
                Phase::Scanning | Phase::Connecting | Phase::Connected
            )
    }

    /// The device list, shown only once scanning has completed.
    pub fn visible_devices(&self) -> Option<&DeviceCatalog> {
        (self.phase() == Phase::Found).then_some(self.catalog.as_ref())
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.state.selected().and_then(|id| self.catalog.get(id))
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            phase: self.phase(),
            progress: self.state.progress(),
            selected: self.state.selected().map(str::to_string),
            finished: self.finished,
        }
    }

    pub fn take_events(&mut self) -> Vec<FlowEvent> {
        mem::take(&mut self.events)
    }

    /// Begins scanning. Returns `false` and changes nothing unless the flow is idle.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> bool {
        if self.phase() != Phase::Idle {
            warn!(phase = %self.phase(), "Flow already started; ignoring start.");
            return false;
        }

        self.enter(ConnectionState::Scanning { progress: 0 });
        true
    }

    /// Picks a device and begins connecting to it if the pick is valid right now.
    #[instrument(skip(self))]
    pub fn select(&mut self, device_id: &str) -> Selection {
        let selection = SelectionHandler::new(&self.catalog, self.policy).validate(self.phase(), device_id);

        if let Selection::Accepted { device_id } = &selection {
            self.enter(ConnectionState::Connecting {
                device_id: device_id.clone(),
                progress: 0,
            });
        }

        selection
    }

    /// Advances the current state by `dt`.
    ///
    /// Time left over after a state completes is dropped; the next state starts from zero.
    pub fn tick(&mut self, dt: Duration) {
        if !self.is_timed() {
            return;
        }

        let duration = match self.phase() {
            Phase::Scanning => self.timings.scan,
            Phase::Connecting => self.timings.connect,
            Phase::Connected => self.timings.redirect,
            Phase::Idle | Phase::Found => return,
        };

        self.elapsed = self.elapsed.saturating_add(dt);
        let pct = percent(self.elapsed, duration);

        if let ConnectionState::Scanning { progress } | ConnectionState::Connecting { progress, .. } =
            &mut self.state
        {
            if pct > *progress {
                *progress = pct;
                debug!(progress = pct, "Progress advanced.");
                self.events.push(FlowEvent::Progress(pct));
            }
        }

        if self.elapsed < duration {
            return;
        }

        let next = match &self.state {
            ConnectionState::Scanning { .. } => Some(ConnectionState::Found),
            ConnectionState::Connecting { device_id, .. } => Some(ConnectionState::Connected {
                device_id: device_id.clone(),
            }),
            _ => None,
        };

        match next {
            Some(next) => self.enter(next),
            None => {
                self.finished = true;
                info!(route = %self.dashboard_route, "Flow complete; redirecting.");
                self.events
                    .push(FlowEvent::Navigate(self.dashboard_route.clone()));
            }
        }
    }

    fn enter(&mut self, state: ConnectionState) {
        let from = self.phase();
        self.state = state;
        self.elapsed = Duration::ZERO;

        let to = self.phase();
        match self.state.selected() {
            Some(device_id) => info!(%from, %to, device_id, "Flow state changed."),
            None => info!(%from, %to, "Flow state changed."),
        }
        self.events.push(FlowEvent::PhaseChanged(to));
    }
}
