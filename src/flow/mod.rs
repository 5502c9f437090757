pub mod driver;
pub mod selection;
pub mod sequencer;

use std::{fmt, time::Duration};

use serde::Deserialize;

use crate::serde_ext::humantime_serde_duration;

pub use driver::FlowHandle;
pub use selection::{IgnoreReason, Selection, SelectionHandler, SelectionPolicy};
pub use sequencer::StepSequencer;

/// Where a flow instance currently is, without the per-state data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    Found,
    Connecting,
    Connected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Scanning => "scanning",
            Phase::Found => "found",
            Phase::Connecting => "connecting",
            Phase::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// State of one connection flow instance.
///
/// `progress` is a percentage (0-100) of the state's fixed duration and starts at 0 on every
/// entry into a timed state. The selected device is held by id only; the catalog owns the record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Scanning {
        progress: u8,
    },
    Found,
    Connecting {
        device_id: String,
        progress: u8,
    },
    Connected {
        device_id: String,
    },
}

impl ConnectionState {
    pub fn phase(&self) -> Phase {
        match self {
            ConnectionState::Idle => Phase::Idle,
            ConnectionState::Scanning { .. } => Phase::Scanning,
            ConnectionState::Found => Phase::Found,
            ConnectionState::Connecting { .. } => Phase::Connecting,
            ConnectionState::Connected { .. } => Phase::Connected,
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            ConnectionState::Scanning { progress } | ConnectionState::Connecting { progress, .. } => {
                *progress
            }
            // Found keeps the completed scan on display until a device is picked.
            ConnectionState::Found => 100,
            _ => 0,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            ConnectionState::Connecting { device_id, .. } | ConnectionState::Connected { device_id } => {
                Some(device_id)
            }
            _ => None,
        }
    }
}

/// Point-in-time view of a flow, as published by [`FlowHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowSnapshot {
    pub phase: Phase,
    pub progress: u8,
    pub selected: Option<String>,
    /// Set once the dashboard redirect has been issued.
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    PhaseChanged(Phase),
    Progress(u8),
    /// Leave the flow for the given route.
    Navigate(String),
}

/// Fixed delays of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Period of the progress timer.
    ///
    /// Default: `100ms`.
    #[serde(deserialize_with = "humantime_serde_duration::deserialize")]
    pub tick: Duration,

    /// Time spent in Scanning before devices are shown.
    ///
    /// Default: `3s`.
    #[serde(deserialize_with = "humantime_serde_duration::deserialize")]
    pub scan: Duration,

    /// Time spent in Connecting after a pick.
    ///
    /// Default: `15s`.
    #[serde(deserialize_with = "humantime_serde_duration::deserialize")]
    pub connect: Duration,

    /// Delay between Connected and the dashboard redirect.
    ///
    /// Default: `6s`.
    #[serde(deserialize_with = "humantime_serde_duration::deserialize")]
    pub redirect: Duration,
}

impl Timings {
    /// Shortest timer period a flow runs with.
    pub const MIN_TICK: Duration = Duration::from_millis(1);

    /// The configured tick, raised to [`Timings::MIN_TICK`] if it is shorter.
    pub fn tick_period(&self) -> Duration {
        self.tick.max(Self::MIN_TICK)
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            scan: Duration::from_secs(3),
            connect: Duration::from_secs(15),
            redirect: Duration::from_secs(6),
        }
    }
}
