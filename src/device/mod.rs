pub mod catalog;

use std::{collections::BTreeSet, fmt, time::SystemTime};

use serde::Deserialize;

use crate::serde_ext::last_sync;

pub use catalog::DeviceCatalog;

/// Kind of hardware a catalog entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Wearable,
    Phone,
}

/// Coarse link quality shown next to a device while picking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Poor,
    Medium,
    Strong,
    Excellent,
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalQuality::Poor => "poor",
            SignalQuality::Medium => "medium",
            SignalQuality::Strong => "strong",
            SignalQuality::Excellent => "excellent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastSync {
    JustNow,
    At(SystemTime),
}

impl fmt::Display for LastSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastSync::JustNow => f.write_str(last_sync::JUST_NOW),
            LastSync::At(t) => write!(f, "{}", humantime::format_rfc3339_seconds(*t)),
        }
    }
}

/// A connectable device as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    /// Catalog key; unique within a [`DeviceCatalog`].
    pub id: String,
    pub name: String,
    pub category: DeviceCategory,
    /// Battery charge in percent (0-100).
    pub battery: u8,
    pub signal: SignalQuality,
    #[serde(deserialize_with = "last_sync::deserialize")]
    pub last_sync: LastSync,
    pub firmware: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Display model name.
    pub model: String,
    /// Presentation only.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Device {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, battery {}%, signal {}, fw {}, synced {})",
            self.id, self.name, self.model, self.battery, self.signal, self.firmware, self.last_sync
        )
    }
}
