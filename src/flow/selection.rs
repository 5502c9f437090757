use serde::Deserialize;
use tracing::warn;

use crate::{device::DeviceCatalog, flow::Phase};

/// Which phases accept a device pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Only once scanning has finished and the list is shown.
    FoundOnly,
    /// Also while scanning is still running.
    #[default]
    ScanningOrFound,
}

impl SelectionPolicy {
    pub fn permits(self, phase: Phase) -> bool {
        match (self, phase) {
            (_, Phase::Found) => true,
            (SelectionPolicy::ScanningOrFound, Phase::Scanning) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownDevice(String),
    NotSelectable(Phase),
}

/// Outcome of a device pick. Ignored picks leave the flow untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Accepted { device_id: String },
    Ignored(IgnoreReason),
}

impl Selection {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Selection::Accepted { .. })
    }
}

/// Checks a pick against the catalog and the selection policy.
#[derive(Debug, Clone, Copy)]
pub struct SelectionHandler<'a> {
    catalog: &'a DeviceCatalog,
    policy: SelectionPolicy,
}

impl<'a> SelectionHandler<'a> {
    pub fn new(catalog: &'a DeviceCatalog, policy: SelectionPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn validate(&self, phase: Phase, device_id: &str) -> Selection {
        if !self.policy.permits(phase) {
            warn!(%phase, device_id, "Ignoring device pick: not selectable right now.");
            return Selection::Ignored(IgnoreReason::NotSelectable(phase));
        }

        if !self.catalog.contains(device_id) {
            warn!(device_id, "Ignoring device pick: not in catalog.");
            return Selection::Ignored(IgnoreReason::UnknownDevice(device_id.to_string()));
        }

        Selection::Accepted {
            device_id: device_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::catalog::default_devices;

    fn catalog() -> DeviceCatalog {
        DeviceCatalog::new(default_devices()).unwrap()
    }

    #[test]
    fn accepts_known_device_when_found() {
        let catalog = catalog();
        let handler = SelectionHandler::new(&catalog, SelectionPolicy::FoundOnly);
        assert_eq!(
            handler.validate(Phase::Found, "3"),
            Selection::Accepted { device_id: "3".into() }
        );
    }

    #[test]
    fn ignores_unknown_device() {
        let catalog = catalog();
        let handler = SelectionHandler::new(&catalog, SelectionPolicy::default());
        assert_eq!(
            handler.validate(Phase::Found, "42"),
            Selection::Ignored(IgnoreReason::UnknownDevice("42".into()))
        );
    }

    #[test]
    fn policy_decides_about_scanning() {
        let catalog = catalog();
        let strict = SelectionHandler::new(&catalog, SelectionPolicy::FoundOnly);
        let lenient = SelectionHandler::new(&catalog, SelectionPolicy::ScanningOrFound);

        assert_eq!(
            strict.validate(Phase::Scanning, "1"),
            Selection::Ignored(IgnoreReason::NotSelectable(Phase::Scanning))
        );
        assert!(lenient.validate(Phase::Scanning, "1").is_accepted());
    }

    #[test]
    fn never_selectable_outside_scanning_and_found() {
        for phase in [Phase::Idle, Phase::Connecting, Phase::Connected] {
            assert!(!SelectionPolicy::ScanningOrFound.permits(phase));
            assert!(!SelectionPolicy::FoundOnly.permits(phase));
        }
    }
}
