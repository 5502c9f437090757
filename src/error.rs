use std::time::Duration;

use thiserror::Error;

use crate::flow::Phase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Device id '{0}' appears more than once in the catalog")]
    DuplicateId(String),

    #[error("Device '{id}' reports a battery level of {battery}%, expected 0-100")]
    BatteryOutOfRange { id: String, battery: u8 },
}

/// Failures a real pairing backend could report.
///
/// The simulated flow always succeeds, so nothing constructs these yet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Device '{device_id}' could not be reached")]
    DeviceUnreachable { device_id: String },

    #[error("{phase:?} did not complete within {after:?}")]
    Timeout { phase: Phase, after: Duration },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("The connection flow has already ended")]
    Closed,

    #[error("Connection failed: {source}")]
    Connection {
        #[from]
        source: ConnectionError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_device() {
        let err = CatalogError::BatteryOutOfRange { id: "7".into(), battery: 120 };
        assert_eq!(
            err.to_string(),
            "Device '7' reports a battery level of 120%, expected 0-100"
        );

        let err: FlowError = ConnectionError::DeviceUnreachable { device_id: "2".into() }.into();
        assert_eq!(
            err.to_string(),
            "Connection failed: Device '2' could not be reached"
        );
    }
}
