#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One decoded TF-Luna measurement.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementFrame {
    /// Distance to the target in centimetres.
    pub distance_cm: u16,
    /// Amplitude of the returned signal.
    pub signal_strength: u16,
    /// Chip temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Checksum validation result of the frame.
    pub checksum_correct: bool,
}
