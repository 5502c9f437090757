// -- std imports
use std::fs;
use std::sync::OnceLock;

// -- crate imports (conditional)
#[cfg(not(debug_assertions))]
use anyhow::Context;

// -- crate imports
use anyhow::{Result, ensure};
use tracing::{info, warn};

// -- module imports
use crate::device::{Device, DeviceCatalog, catalog::default_devices};
use crate::error::CatalogError;
use crate::flow::{SelectionPolicy, Timings};

pub const APP_NAME: &str = "fitpair";

/// Global singleton instance of [`Conf`].
static CONF: OnceLock<Conf> = OnceLock::new();

/// Returns the path to the configuration file.
///
/// In debug builds this is `./contrib/config.yml` in the current working directory. In release
/// builds this uses the XDG base directory and resolves to a path like
/// `~/.config/fitpair/config.yml`.
///
/// # Errors
/// - [`anyhow::Error`] if the config file path cannot be determined (release builds only).
pub fn conf_filepath() -> Result<String> {
    #[cfg(debug_assertions)]
    {
        Ok("./contrib/config.yml".into())
    }

    #[cfg(not(debug_assertions))]
    {
        xdg::BaseDirectories::with_prefix(APP_NAME)
            .get_config_file("config.yml")
            .map(|path| path.to_string_lossy().to_string())
            .context("Could not determine config file path")
    }
}

/// Application configuration.
///
/// Deserialized from a YAML config file; any field left out keeps its default.
#[derive(Debug, PartialEq, Eq, Clone, serde::Deserialize)]
#[serde(default)]
pub struct Conf {
    /// Fixed delays of the connection flow.
    ///
    /// Default: tick `100ms`, scan `3s`, connect `15s`, redirect `6s`.
    pub timings: Timings,

    /// Phases in which a device pick is accepted.
    ///
    /// Default: `scanning_or_found`.
    pub selection_policy: SelectionPolicy,

    /// Route handed to the navigator once the flow completes.
    ///
    /// Default: `/dashboard`.
    pub dashboard_route: String,

    /// Whether a desktop notification is shown when a device connects.
    ///
    /// Default: `true`.
    pub notifications_enabled: bool,

    /// Devices offered by the flow, in display order.
    ///
    /// Default: four built-in devices with ids `1` to `4`.
    pub devices: Vec<Device>,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            selection_policy: SelectionPolicy::default(),
            dashboard_route: "/dashboard".to_string(),
            notifications_enabled: true,
            devices: default_devices(),
        }
    }
}

impl Conf {
    /// Builds the device catalog from [`Conf::devices`].
    ///
    /// # Errors
    /// - [`CatalogError`] if the configured devices are inconsistent.
    pub fn catalog(&self) -> Result<DeviceCatalog, CatalogError> {
        DeviceCatalog::new(self.devices.iter().cloned())
    }

    /// Parses a configuration from YAML text and checks it with [`Conf::validate`].
    pub fn parse(contents: &str) -> Result<Self> {
        let conf = serde_yaml::from_str::<Conf>(contents)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Rejects values the flow cannot run with.
    ///
    /// # Errors
    /// - [`anyhow::Error`] if `timings.tick` is zero.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.timings.tick.is_zero(),
            "timings.tick must be greater than zero"
        );
        Ok(())
    }

    /// Loads the configuration from `path`, or from [`conf_filepath`] when none is given, into
    /// the global instance.
    ///
    /// If the path cannot be determined or the file cannot be read or parsed, falls back to
    /// [`Conf::instance`], which uses the default configuration.
    pub fn load(path: Option<&str>) -> &'static Self {
        if let Some(p) = path {
            return Self::from_file(p);
        }

        match conf_filepath() {
            Ok(p) => Self::from_file(&p),
            Err(e) => {
                warn!(
                    "Could not determine config file path: {}. Falling back to defaults.",
                    e
                );
                Self::instance()
            }
        }
    }

    /// Initializes the global configuration from the YAML file at `path`.
    ///
    /// If the configuration is already initialized, the existing instance is returned and the file
    /// is ignored. On any read or parse error, falls back to [`Conf::default`].
    pub fn from_file(path: &str) -> &'static Self {
        if let Some(conf) = CONF.get() {
            warn!(
                "Conf::from_file({}) called, but configuration is already initialized. Using \
                    existing configuration and ignoring the file.",
                path
            );
            return conf;
        }

        CONF.get_or_init(|| Self::read(path))
    }

    fn read(path: &str) -> Self {
        fs::read_to_string(path)
            .map_err(|e| {
                warn!(
                    "Could not read config file '{}': {}. Falling back to defaults.",
                    path, e
                );
            })
            .and_then(|contents| {
                Self::parse(&contents).map_err(|e| {
                    warn!(
                        "Could not parse config file '{}': {}. Falling back to defaults.",
                        path, e
                    );
                })
            })
            .map(|conf| {
                info!("Successfully loaded configuration from '{}'.", path);
                conf
            })
            .unwrap_or_else(|_| Conf::default())
    }

    /// Returns the global configuration instance.
    ///
    /// If the configuration has not been loaded yet, this initializes it with [`Conf::default`]
    /// and logs a warning.
    pub fn instance() -> &'static Self {
        CONF.get_or_init(|| {
            warn!(
                "Conf::instance() called before Conf::from_file(); initializing configuration with \
                default values."
            );
            Conf::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::device::{LastSync, SignalQuality};

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Conf::parse("{}").unwrap(), Conf::default());
    }

    #[test]
    fn partial_timings_keep_other_defaults() {
        let conf = Conf::parse("timings:\n  scan: 500ms\nselection_policy: found_only\n").unwrap();
        assert_eq!(conf.timings.scan, Duration::from_millis(500));
        assert_eq!(conf.timings.connect, Duration::from_secs(15));
        assert_eq!(conf.selection_policy, SelectionPolicy::FoundOnly);
        assert_eq!(conf.dashboard_route, "/dashboard");
    }

    #[test]
    fn devices_replace_the_builtin_catalog() {
        let yaml = r#"
devices:
  - id: a
    name: Trail Band
    category: wearable
    battery: 40
    signal: excellent
    last_sync: 2024-05-01T08:30:00Z
    firmware: 3.0.0
    model: Trail Band 2
    capabilities: [gps, heart-rate]
"#;
        let conf = Conf::parse(yaml).unwrap();
        let catalog = conf.catalog().unwrap();
        assert_eq!(catalog.len(), 1);

        let device = catalog.get("a").unwrap();
        assert_eq!(device.signal, SignalQuality::Excellent);
        assert!(matches!(device.last_sync, LastSync::At(_)));
        assert!(device.has_capability("gps"));
        assert_eq!(device.image_url, None);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        assert_eq!(Conf::read("./does/not/exist.yml"), Conf::default());
    }

    #[test]
    fn zero_tick_is_rejected() {
        let err = Conf::parse("timings:\n  tick: 0s\n").unwrap_err();
        assert_eq!(err.to_string(), "timings.tick must be greater than zero");
        assert!(Conf::parse("timings:\n  tick: 1ms\n").is_ok());
    }

    #[test]
    fn zero_tick_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("fitpair-zero-tick-{}.yml", std::process::id()));
        fs::write(&path, "timings:\n  tick: 0s\n").unwrap();
        let conf = Conf::read(path.to_str().unwrap());
        fs::remove_file(&path).ok();
        assert_eq!(conf, Conf::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Conf::parse("selection_policy: whenever\n").is_err());
    }
}
