// -- std imports
use std::collections::HashMap;

// -- crate imports
use anyhow::Result;
use zbus::{Connection, zvariant::Value};

// -- module imports
use crate::{configuration::APP_NAME, device::Device};

/// A desktop toast, sent through `org.freedesktop.Notifications` on the session bus.
#[derive(Debug, Clone)]
pub struct Toast {
    title: String,
    body: String,
    icon: String,
}

impl Toast {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
            icon: String::new(),
        }
    }

    /// Toast announcing that pairing with `device` finished.
    pub fn device_connected(device: &Device) -> Self {
        Self::new("Device connected")
            .body(format!(
                "{} ({}) is paired. Battery at {}%.",
                device.name, device.model, device.battery
            ))
            .icon("bluetooth-active-symbolic")
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Icon name from your icon theme (e.g. "dialog-information"), or "" for none.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Shows the toast and returns the id the daemon assigned to it.
    pub async fn show(self) -> Result<u32> {
        let connection = Connection::session().await?;

        let reply = connection
            .call_method(
                Some("org.freedesktop.Notifications"),
                "/org/freedesktop/Notifications",
                Some("org.freedesktop.Notifications"),
                "Notify",
                &(
                    APP_NAME,
                    0u32, // replaces_id
                    self.icon,
                    self.title,
                    self.body,
                    Vec::<String>::new(), // actions
                    HashMap::<&str, Value>::new(), // hints
                    -1i32, // expire timeout; server default
                ),
            )
            .await?;

        Ok(reply.body().deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::catalog::default_devices;

    #[test]
    fn connected_toast_mentions_device() {
        let device = &default_devices()[1];
        let toast = Toast::device_connected(device);
        assert_eq!(toast.title, "Device connected");
        assert_eq!(toast.body, "Stride Watch (Stride Watch Pro) is paired. Battery at 62%.");
        assert_eq!(toast.icon, "bluetooth-active-symbolic");
    }
}
