#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Servo axis of the pan/tilt bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Horizontal rotation
    Pan,
    /// Vertical rotation
    Tilt,
}

/// Commanded servo position, as a pair of pulse widths in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanTiltSetpoint {
    /// Pulse width sent to the pan servo.
    pub pan: u32,
    /// Pulse width sent to the tilt servo.
    pub tilt: u32,
}

impl PanTiltSetpoint {
    pub const fn new(pan: u32, tilt: u32) -> Self {
        PanTiltSetpoint { pan, tilt }
    }

    /// Returns a copy with the pan pulse width replaced.
    pub const fn with_pan(self, pan: u32) -> Self {
        PanTiltSetpoint { pan, ..self }
    }

    /// Returns a copy with the tilt pulse width replaced.
    pub const fn with_tilt(self, tilt: u32) -> Self {
        PanTiltSetpoint { tilt, ..self }
    }

    /// Pulse width of the given axis.
    pub const fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }

    /// Nominal servo angles `(pan, tilt)` in degrees.
    ///
    /// Assumes the usual hobby-servo mapping where 500 us is 0 degrees and
    /// 2500 us is 180 degrees.
    pub fn to_degrees(&self) -> (f64, f64) {
        (pulse_width_to_degree(self.pan), pulse_width_to_degree(self.tilt))
    }
}

fn pulse_width_to_degree(pulse_width: u32) -> f64 {
    (pulse_width as f64 - 500.) * 180. / 2000.
}
