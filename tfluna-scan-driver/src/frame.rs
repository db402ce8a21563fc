use crate::constants::{FRAME_MARKER, FRAME_SIZE};
use crate::error::ScanError;
use crate::numeric::{to_string, to_temperature, to_u16};
use std::collections::VecDeque;
use tfluna_scan_data::MeasurementFrame;

pub(crate) fn is_frame_marker(element0: u8, element1: u8) -> bool {
    element0 == FRAME_MARKER && element1 == FRAME_MARKER
}

/// Low byte of the sum of the first eight bytes.
pub(crate) fn calc_checksum(raw: &[u8; FRAME_SIZE]) -> u8 {
    raw[..FRAME_SIZE - 1]
        .iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

pub(crate) fn validate_frame_marker(raw: &[u8; FRAME_SIZE]) -> Result<(), ScanError> {
    if !is_frame_marker(raw[0], raw[1]) {
        return Err(ScanError::InvalidFrameMarker(to_string(&raw[0..2])));
    }
    Ok(())
}

pub(crate) fn decode_frame(raw: &[u8; FRAME_SIZE]) -> Result<MeasurementFrame, ScanError> {
    validate_frame_marker(raw)?;
    Ok(MeasurementFrame {
        distance_cm: to_u16(raw[3], raw[2]),
        signal_strength: to_u16(raw[5], raw[4]),
        temperature_c: to_temperature(raw[6], raw[7]),
        checksum_correct: calc_checksum(raw) == raw[8],
    })
}

/// Index of the first marker candidate in `buffer`.
///
/// A trailing lone 0x59 counts as a candidate since its partner may not
/// have arrived yet.
pub(crate) fn find_start_index(buffer: &VecDeque<u8>) -> Option<usize> {
    for i in 0..buffer.len() {
        let e0 = buffer[i];
        match buffer.get(i + 1) {
            Some(e1) if is_frame_marker(e0, *e1) => return Some(i),
            None if e0 == FRAME_MARKER => return Some(i),
            _ => continue,
        }
    }
    None
}
