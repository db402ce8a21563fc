pub(crate) const FRAME_SIZE: usize = 9;
pub(crate) const FRAME_MARKER: u8 = 0x59;
pub(crate) const DEFAULT_BAUD_RATE: u32 = 115_200;
pub(crate) const DEFAULT_PORT_NAME: &str = "/dev/serial0";
pub(crate) const SERIAL_TIMEOUT_MS: u64 = 10;
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 5;
pub(crate) const DEFAULT_STRENGTH_THRESHOLD: u16 = 50;
pub(crate) const DEFAULT_DISTANCE_CEILING_CM: u16 = 6000;
// Pulse width that switches the servo output off
pub(crate) const SERVO_OFF_PULSE_WIDTH: u32 = 0;
