//! Test doubles for the byte stream and the servos.

use crate::actuator::Actuator;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::serial::ByteSource;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tfluna_scan_data::Axis;

/// Byte stream fed by the test. Once closed and drained it reports
/// [`ScanError::TransportClosed`].
#[derive(Clone, Default)]
pub(crate) struct SharedSource {
    bytes: Arc<Mutex<VecDeque<u8>>>,
    closed: Arc<AtomicBool>,
}

impl SharedSource {
    pub(crate) fn new() -> Self {
        SharedSource::default()
    }

    pub(crate) fn push(&self, data: &[u8]) {
        self.bytes.lock().unwrap().extend(data);
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_shared(&self) -> bool {
        Arc::strong_count(&self.bytes) > 1
    }
}

impl ByteSource for SharedSource {
    fn bytes_available(&mut self) -> Result<usize, ScanError> {
        let bytes = self.bytes.lock().unwrap();
        if bytes.is_empty() && self.closed.load(Ordering::SeqCst) {
            return Err(ScanError::TransportClosed);
        }
        Ok(bytes.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ScanError> {
        self.bytes.lock().unwrap().read_bytes(buf)
    }
}

/// Records every command it receives.
#[derive(Clone, Default)]
pub(crate) struct RecordingActuator {
    commands: Arc<Mutex<Vec<(Axis, u32)>>>,
}

impl RecordingActuator {
    pub(crate) fn new() -> Self {
        RecordingActuator::default()
    }

    pub(crate) fn commands(&self) -> Vec<(Axis, u32)> {
        self.commands.lock().unwrap().clone()
    }
}

impl Actuator for RecordingActuator {
    fn set_axis(&mut self, axis: Axis, pulse_width: u32) -> Result<(), ScanError> {
        self.commands.lock().unwrap().push((axis, pulse_width));
        Ok(())
    }
}

pub(crate) struct FailingActuator;

impl Actuator for FailingActuator {
    fn set_axis(&mut self, axis: Axis, _pulse_width: u32) -> Result<(), ScanError> {
        Err(ScanError::ActuatorError(format!("{:?} servo unplugged", axis)))
    }
}

/// Small sweep without dwell, 3 rows of 5 columns.
pub(crate) fn fast_config() -> ScanConfig {
    ScanConfig {
        tilt_start: 2000,
        tilt_end: 2100,
        tilt_step: 50,
        pan_min: 500,
        pan_max: 2000,
        pan_steps: 4,
        settle_delay_row_ms: 0,
        step_delay_ms: 0,
        poll_interval_ms: 1,
        ..Default::default()
    }
}

/// Frame with a marker and a temperature of 0 C, checksum left at zero.
pub(crate) fn frame_bytes(distance_cm: u16, signal_strength: u16) -> [u8; 9] {
    let [d0, d1] = distance_cm.to_le_bytes();
    let [s0, s1] = signal_strength.to_le_bytes();
    [0x59, 0x59, d0, d1, s0, s1, 0x00, 0x08, 0x00]
}

/// Same as [`frame_bytes`] with a correct checksum.
pub(crate) fn valid_frame(distance_cm: u16, signal_strength: u16) -> [u8; 9] {
    let mut raw = frame_bytes(distance_cm, signal_strength);
    raw[8] = raw[..8].iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
    raw
}
