use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DISTANCE_CEILING_CM, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT_NAME,
    DEFAULT_STRENGTH_THRESHOLD,
};
use crate::error::{ConfigError, ScanError};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;
use tfluna_scan_data::PanTiltSetpoint;

/// How the decoder recovers when a frame window does not start with the marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Drop the whole 9 byte window and read the next one.
    #[default]
    DiscardWindow,
    /// Drop bytes only up to the next marker candidate.
    ScanForMarker,
}

/// Settings of a scan session.
///
/// All fields have defaults, so a TOML file only needs the ones it changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// First tilt row, pulse width in microseconds.
    pub tilt_start: u32,
    /// Last tilt row (inclusive).
    pub tilt_end: u32,
    pub tilt_step: u32,
    pub pan_min: u32,
    pub pan_max: u32,
    /// Number of pan steps per row. Each row visits `pan_steps + 1` columns.
    pub pan_steps: u32,
    /// Dwell after moving the tilt servo, before the row is panned.
    pub settle_delay_row_ms: u64,
    /// Dwell between consecutive pan commands.
    pub step_delay_ms: u64,
    /// Readings must be strictly stronger than this.
    pub strength_threshold: u16,
    /// Readings must be strictly closer than this.
    pub distance_ceiling_cm: u16,
    /// Reject frames whose checksum byte does not match.
    pub require_checksum: bool,
    /// Interval at which waiting loops re-check for data and for a stop request.
    pub poll_interval_ms: u64,
    pub resync: ResyncPolicy,
    /// End the session once the sweep has visited every row.
    pub stop_when_sweep_complete: bool,
    /// Upper bound on the session length, unbounded if absent.
    pub run_duration_ms: Option<u64>,
    pub port_name: String,
    pub baud_rate: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            tilt_start: 2000,
            tilt_end: 2500,
            tilt_step: 50,
            pan_min: 500,
            pan_max: 2000,
            pan_steps: 100,
            settle_delay_row_ms: 900,
            step_delay_ms: 100,
            strength_threshold: DEFAULT_STRENGTH_THRESHOLD,
            distance_ceiling_cm: DEFAULT_DISTANCE_CEILING_CM,
            require_checksum: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            resync: ResyncPolicy::default(),
            stop_when_sweep_complete: true,
            run_duration_ms: None,
            port_name: DEFAULT_PORT_NAME.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl ScanConfig {
    /// Load a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let config_str = read_to_string(path)?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ScanError> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pan_steps == 0 {
            return Err(ConfigError::ZeroPanSteps);
        }
        if self.pan_max <= self.pan_min {
            return Err(ConfigError::InvalidPanRange(self.pan_min, self.pan_max));
        }
        if self.pan_column_size() == 0 {
            return Err(ConfigError::ZeroColumnSize(
                self.pan_min,
                self.pan_max,
                self.pan_steps,
            ));
        }
        if self.tilt_step == 0 {
            return Err(ConfigError::ZeroTiltStep);
        }
        if self.tilt_end >= self.tilt_start
            && ((self.tilt_end - self.tilt_start) / self.tilt_step)
                .checked_add(1)
                .is_none()
        {
            return Err(ConfigError::TooManyTiltRows(
                self.tilt_start,
                self.tilt_end,
                self.tilt_step,
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Pan distance between two columns. Only meaningful on a validated config.
    pub fn pan_column_size(&self) -> u32 {
        self.pan_max
            .saturating_sub(self.pan_min)
            .checked_div(self.pan_steps)
            .unwrap_or(0)
    }

    /// Number of tilt rows the sweep visits. Saturates on a range `validate` rejects.
    pub fn n_rows(&self) -> u32 {
        if self.tilt_end < self.tilt_start || self.tilt_step == 0 {
            return 0;
        }
        ((self.tilt_end - self.tilt_start) / self.tilt_step).saturating_add(1)
    }

    /// Setpoint the position store holds before the first command.
    pub fn initial_setpoint(&self) -> PanTiltSetpoint {
        PanTiltSetpoint::new(self.pan_min, self.tilt_start)
    }

    pub fn settle_delay_row(&self) -> Duration {
        Duration::from_millis(self.settle_delay_row_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn run_duration(&self) -> Option<Duration> {
        self.run_duration_ms.map(Duration::from_millis)
    }
}
