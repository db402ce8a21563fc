use std::io;

/// Reasons a scan configuration is rejected before a session starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("pan_steps must be at least 1")]
    ZeroPanSteps,
    #[error("pan_max ({1}) must be greater than pan_min ({0})")]
    InvalidPanRange(u32, u32),
    #[error("pan range {0}..={1} is too narrow for {2} steps, the column size would be zero")]
    ZeroColumnSize(u32, u32, u32),
    #[error("tilt_step must be at least 1")]
    ZeroTiltStep,
    #[error("tilt range {0}..={1} with step {2} has more rows than fit in a u32")]
    TooManyTiltRows(u32, u32, u32),
    #[error("poll_interval_ms must be at least 1")]
    ZeroPollInterval,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Frame must start with 0x59 0x59. Observed = {0}.")]
    InvalidFrameMarker(String),
    #[error("A scan session is already running")]
    AlreadyRunning,
    #[error("The byte stream was closed")]
    TransportClosed,
    #[error("The scan record receiver was dropped")]
    SinkClosed,
    #[error("Actuator rejected the command: {0}")]
    ActuatorError(String),
    #[error("The {0} thread panicked")]
    ThreadPanicked(&'static str),
    #[error("Cannot read the configuration file: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error(transparent)]
    SerialError(#[from] serialport::Error),
    #[error(transparent)]
    IoError(#[from] io::Error),
}
