use indexmap::IndexMap;
use tracing::debug;

use crate::{
    device::{Device, DeviceCategory, LastSync, SignalQuality},
    error::CatalogError,
};

/// Ordered, read-only registry of connectable devices keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCatalog {
    devices: IndexMap<String, Device>,
}

impl DeviceCatalog {
    /// Builds a catalog, keeping the order of `devices`.
    ///
    /// # Errors
    /// - [`CatalogError::DuplicateId`] if two entries share an id.
    /// - [`CatalogError::BatteryOutOfRange`] if a battery level exceeds 100.
    pub fn new(devices: impl IntoIterator<Item = Device>) -> Result<Self, CatalogError> {
        let mut map = IndexMap::new();

        for device in devices {
            if device.battery > 100 {
                return Err(CatalogError::BatteryOutOfRange {
                    id: device.id,
                    battery: device.battery,
                });
            }
            if map.contains_key(&device.id) {
                return Err(CatalogError::DuplicateId(device.id));
            }
            map.insert(device.id.clone(), device);
        }

        debug!(devices = map.len(), "Device catalog built.");
        Ok(Self { devices: map })
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    pub fn first(&self) -> Option<&Device> {
        self.devices.first().map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    name: &str,
    category: DeviceCategory,
    battery: u8,
    signal: SignalQuality,
    firmware: &str,
    capabilities: &[&str],
    model: &str,
) -> Device {
    Device {
        id: id.to_string(),
        name: name.to_string(),
        category,
        battery,
        signal,
        last_sync: LastSync::JustNow,
        firmware: firmware.to_string(),
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        model: model.to_string(),
        image_url: None,
    }
}

/// The four devices offered when the configuration does not list any.
pub fn default_devices() -> Vec<Device> {
    vec![
        entry(
            "1",
            "Pulse Band",
            DeviceCategory::Wearable,
            85,
            SignalQuality::Excellent,
            "2.4.1",
            &["heart-rate", "steps", "sleep"],
            "Pulse Band 5",
        ),
        entry(
            "2",
            "Stride Watch",
            DeviceCategory::Wearable,
            62,
            SignalQuality::Strong,
            "1.9.0",
            &["heart-rate", "gps", "spo2", "steps"],
            "Stride Watch Pro",
        ),
        entry(
            "3",
            "Pocket Phone",
            DeviceCategory::Phone,
            47,
            SignalQuality::Medium,
            "14.2",
            &["steps", "gps"],
            "Pocket X",
        ),
        entry(
            "4",
            "Ring Tracker",
            DeviceCategory::Wearable,
            93,
            SignalQuality::Poor,
            "0.8.7",
            &["sleep", "temperature"],
            "Ring Gen 3",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_looks_up_by_id() {
        let catalog = DeviceCatalog::new(default_devices()).unwrap();
        let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        assert_eq!(catalog.get("3").unwrap().name, "Pocket Phone");
        assert_eq!(catalog.first().unwrap().id, "1");
        assert!(!catalog.contains("5"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut devices = default_devices();
        devices.push(devices[1].clone());
        assert_eq!(
            DeviceCatalog::new(devices),
            Err(CatalogError::DuplicateId("2".into()))
        );
    }

    #[test]
    fn rejects_battery_above_hundred() {
        let mut devices = default_devices();
        devices[0].battery = 101;
        assert!(matches!(
            DeviceCatalog::new(devices),
            Err(CatalogError::BatteryOutOfRange { battery: 101, .. })
        ));
    }

    #[test]
    fn capabilities_are_queryable() {
        let catalog = DeviceCatalog::new(default_devices()).unwrap();
        assert!(catalog.get("2").unwrap().has_capability("gps"));
        assert!(!catalog.get("4").unwrap().has_capability("gps"));
    }
}
