use crate::constants::SERVO_OFF_PULSE_WIDTH;
use crate::error::ScanError;
use log::debug;
use tfluna_scan_data::Axis;

/// Output stage driving the pan and tilt servos.
///
/// Commands are fire-and-forget: the servo is assumed to take some time to
/// reach the position, which the caller waits out with its own dwell.
pub trait Actuator {
    fn set_axis(&mut self, axis: Axis, pulse_width: u32) -> Result<(), ScanError>;
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn set_axis(&mut self, axis: Axis, pulse_width: u32) -> Result<(), ScanError> {
        (**self).set_axis(axis, pulse_width)
    }
}

/// Dry-run actuator that only logs the commands it receives.
#[derive(Clone, Debug, Default)]
pub struct LogActuator;

impl Actuator for LogActuator {
    fn set_axis(&mut self, axis: Axis, pulse_width: u32) -> Result<(), ScanError> {
        debug!("{:?} servo <- {} us", axis, pulse_width);
        Ok(())
    }
}

/// Cut the pulse output of both servos.
///
/// Both axes are commanded even when the first one fails. The first error
/// is returned.
pub fn switch_off<A: Actuator + ?Sized>(actuator: &mut A) -> Result<(), ScanError> {
    let pan = actuator.set_axis(Axis::Pan, SERVO_OFF_PULSE_WIDTH);
    let tilt = actuator.set_axis(Axis::Tilt, SERVO_OFF_PULSE_WIDTH);
    pan.and(tilt)
}
