use crate::constants::SERIAL_TIMEOUT_MS;
use crate::error::ScanError;
use log::debug;
use serialport::SerialPort;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Upstream source of raw sensor bytes.
pub trait ByteSource {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, ScanError>;

    /// Fill `buf` completely.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ScanError>;
}

impl ByteSource for dyn SerialPort {
    fn bytes_available(&mut self) -> Result<usize, ScanError> {
        let n_u32: u32 = self.bytes_to_read()?;
        Ok(n_u32.try_into().unwrap_or(0))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ScanError> {
        self.read_exact(buf).map_err(from_read_error)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn bytes_available(&mut self) -> Result<usize, ScanError> {
        (**self).bytes_available()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ScanError> {
        (**self).read_bytes(buf)
    }
}

/// Replays a fixed byte sequence. Reading past the end reports a closed stream.
impl ByteSource for VecDeque<u8> {
    fn bytes_available(&mut self) -> Result<usize, ScanError> {
        Ok(self.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ScanError> {
        if self.len() < buf.len() {
            return Err(ScanError::TransportClosed);
        }
        let n = buf.len();
        for (dst, src) in buf.iter_mut().zip(self.drain(..n)) {
            *dst = src;
        }
        Ok(())
    }
}

fn from_read_error(err: io::Error) -> ScanError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => ScanError::TransportClosed,
        _ => ScanError::IoError(err),
    }
}

/// Open the serial port the sensor is attached to and drop any stale input.
///
/// # Arguments
///
/// * `port_name` - Serial port name such as `/dev/serial0`.
/// * `baud_rate` - Baud rate, 115200 for a factory configured TF-Luna.
pub fn open_port(port_name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, ScanError> {
    let mut port = serialport::new(port_name, baud_rate)
        .timeout(Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()?;
    flush(&mut port)?;
    debug!("Opened {} at {} baud", port_name, baud_rate);
    Ok(port)
}

pub(crate) fn flush(port: &mut Box<dyn SerialPort>) -> Result<(), ScanError> {
    let n_read: usize = port.bytes_available().unwrap_or(0);
    if n_read == 0 {
        return Ok(());
    }
    let mut stale: Vec<u8> = vec![0; n_read];
    port.read_bytes(stale.as_mut_slice())?;
    Ok(())
}
