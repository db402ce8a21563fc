use crate::setpoint::PanTiltSetpoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A distance measurement paired with the servo position it was taken at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanRecord {
    pub pan: u32,
    pub tilt: u32,
    pub distance_cm: u16,
}

impl ScanRecord {
    pub fn new(setpoint: PanTiltSetpoint, distance_cm: u16) -> Self {
        ScanRecord {
            pan: setpoint.pan,
            tilt: setpoint.tilt,
            distance_cm,
        }
    }

    pub fn setpoint(&self) -> PanTiltSetpoint {
        PanTiltSetpoint::new(self.pan, self.tilt)
    }
}

/// Renders the record as a `pan,tilt,distance` CSV line (without newline).
impl fmt::Display for ScanRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.pan, self.tilt, self.distance_cm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_as_csv() {
        let record = ScanRecord::new(PanTiltSetpoint::new(500, 2000), 100);
        assert_eq!(record.to_string(), "500,2000,100");
        assert_eq!(record.setpoint(), PanTiltSetpoint::new(500, 2000));
    }
}
