pub mod frame;
pub mod record;
pub mod setpoint;

pub use frame::MeasurementFrame;
pub use record::ScanRecord;
pub use setpoint::{Axis, PanTiltSetpoint};
