//! Daemon configuration: load, save, and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use g13_display::DitherMode;
use g13_errors::G13Error;
use g13_input::{InputSettings, MappingTable, RepeatPolicy};
use g13_transport::{ErrorBudget, TransportSettings};
use hid_g13_protocol::ids::{G13_PRODUCT_ID, INTERFACE, LOGITECH_VENDOR_ID};
use hid_g13_protocol::{KeycodeTable, ZoneThresholds};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const SCHEMA_PREFIX: &str = "g13d.config/";
pub const SCHEMA_VERSION: &str = "g13d.config/1";

/// Complete daemon configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Configuration schema version
    pub schema_version: String,
    pub device: DeviceConfig,
    pub input: InputConfig,
    pub display: DisplayConfig,
    pub supervisor: SupervisorConfig,
    /// Key name to action. Read from the file but never written back.
    #[serde(skip_serializing)]
    pub mapping: MappingTable,
    pub logging: LoggingConfig,
}

/// USB device selection and transport timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    /// Bound on each input read in milliseconds
    pub read_timeout_ms: u64,
    /// Timeout for control and LCD writes in milliseconds
    pub write_timeout_ms: u64,
    /// Pause between opening the device and the first poll
    pub settle_delay_ms: u64,
    /// How long shutdown waits for the USB worker
    pub shutdown_timeout_ms: u64,
}

/// Decoder policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Replaces the built-in keycode table for other hardware revisions
    pub keycodes: Option<KeycodeTable>,
    pub thresholds: ZoneThresholds,
    pub repeat: RepeatPolicy,
    /// Period of the joystick repeat clock in milliseconds
    pub repeat_interval_ms: u64,
}

/// LCD and backlight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// LCD refresh period in milliseconds
    pub refresh_ms: u64,
    /// Delay before the first LCD refresh in milliseconds
    pub initial_delay_ms: u64,
    pub dither: DitherMode,
    /// Backlight colour applied at startup
    pub backlight: Option<[u8; 3]>,
}

/// Read loop supervision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Consecutive recoverable USB errors tolerated before shutdown
    pub error_budget: u32,
    /// Inbound queue poll period in milliseconds
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when neither `RUST_LOG` nor `-v` is given
    pub filter: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            device: DeviceConfig::default(),
            input: InputConfig::default(),
            display: DisplayConfig::default(),
            supervisor: SupervisorConfig::default(),
            mapping: MappingTable::g13_default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: LOGITECH_VENDOR_ID,
            product_id: G13_PRODUCT_ID,
            interface: INTERFACE,
            read_timeout_ms: 10,
            write_timeout_ms: 100,
            settle_delay_ms: 500,
            shutdown_timeout_ms: 2000,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        let decoder = InputSettings::default();
        Self {
            keycodes: None,
            thresholds: decoder.thresholds,
            repeat: decoder.repeat,
            repeat_interval_ms: duration_ms(g13_scheduler::REPEAT_INTERVAL),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: duration_ms(g13_scheduler::LCD_REFRESH),
            initial_delay_ms: duration_ms(g13_scheduler::LCD_INITIAL_DELAY),
            dither: DitherMode::default(),
            backlight: None,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            error_budget: ErrorBudget::DEFAULT_LIMIT,
            poll_interval_ms: duration_ms(g13_scheduler::POLL_INTERVAL),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl DeviceConfig {
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            interface: self.interface,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            settle_delay: self.settle_delay(),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl InputConfig {
    pub fn decoder_settings(&self) -> InputSettings {
        InputSettings {
            keycodes: self.keycodes.clone().unwrap_or_else(KeycodeTable::g13),
            thresholds: self.thresholds,
            repeat: self.repeat,
        }
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }
}

impl DisplayConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl SupervisorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl DaemonConfig {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path).await
    }

    /// Load configuration from `path`, writing defaults there if it does not
    /// exist yet
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "Config file not found, creating default");
            let config = Self::default();
            config.save_to_path(path).await?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(G13Error::from)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: DaemonConfig = serde_json::from_str(&content).map_err(|e| {
            invalid(format!("Failed to parse config file {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save configuration to `path` as pretty JSON
    pub async fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(G13Error::from)
                .context("Failed to create config directory")?;
        }

        let content = self.to_json()?;
        tokio::fs::write(path, content)
            .await
            .map_err(G13Error::from)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }

    /// `$HOME/.config/g13/g13d.json`
    pub fn default_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".config").join("g13").join("g13d.json"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.schema_version.starts_with(SCHEMA_PREFIX) {
            return Err(invalid(format!("Invalid schema version: {}", self.schema_version)));
        }

        if self.device.read_timeout_ms == 0 || self.device.read_timeout_ms > 1000 {
            return Err(invalid(format!("Invalid read timeout: {} ms", self.device.read_timeout_ms)));
        }

        if self.device.write_timeout_ms == 0 {
            return Err(invalid(format!("Invalid write timeout: {} ms", self.device.write_timeout_ms)));
        }

        if self.device.shutdown_timeout_ms == 0 {
            return Err(invalid(format!(
                "Invalid shutdown timeout: {} ms",
                self.device.shutdown_timeout_ms
            )));
        }

        ZoneThresholds::new(self.input.thresholds.as_array())
            .map_err(|e| invalid(format!("Invalid joystick thresholds: {e}")))?;

        self.input
            .decoder_settings()
            .validate()
            .map_err(|e| invalid(format!("Invalid input settings: {e}")))?;

        if self.input.repeat_interval_ms == 0 {
            return Err(invalid("Invalid repeat interval: 0 ms"));
        }

        if self.display.refresh_ms == 0 {
            return Err(invalid("Invalid LCD refresh period: 0 ms"));
        }

        if self.supervisor.error_budget == 0 {
            return Err(invalid("Invalid error budget: must be at least 1"));
        }

        if self.supervisor.poll_interval_ms == 0 {
            return Err(invalid("Invalid poll interval: 0 ms"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> anyhow::Error {
    G13Error::config(message).into()
}
