mod actuator;
mod config;
mod constants;
mod controller;
mod decoder;
mod error;
mod frame;
mod numeric;
mod position;
mod sampler;
mod serial;
mod stop;
mod trajectory;

#[cfg(test)]
mod test_support;

pub use crate::actuator::{switch_off, Actuator, LogActuator};
pub use crate::config::{ResyncPolicy, ScanConfig};
pub use crate::controller::{ScanController, SessionReport, SessionState};
pub use crate::decoder::{DecodeOutcome, FrameDecoder, Frames};
pub use crate::error::{ConfigError, ScanError};
pub use crate::position::PositionStore;
pub use crate::sampler::{SamplerReport, ScanSampler, SignalFilter};
pub use crate::serial::{open_port, ByteSource};
pub use crate::stop::StopSignal;
pub use crate::trajectory::{
    PanDirection, SweepCommand, SweepPlan, SweepReport, TrajectoryGenerator,
};

use crossbeam_channel::Receiver;
use log::info;
use tfluna_scan_data::ScanRecord;

/// Function to launch a room scan.
/// # Arguments
///
/// * `config` - Scan settings. `port_name` and `baud_rate` select the sensor port.
/// * `actuator` - Output stage of the pan and tilt servos.
///
/// The returned controller owns the session; call [`ScanController::wait`]
/// or [`ScanController::stop`] to end it.
pub fn run_scanner<A>(
    config: ScanConfig,
    actuator: A,
) -> Result<(ScanController, Receiver<ScanRecord>), ScanError>
where
    A: Actuator + Send + 'static,
{
    config.validate()?;
    let port = open_port(&config.port_name, config.baud_rate)?;
    info!("Scanning with the sensor on {}", config.port_name);

    let controller = ScanController::new();
    let records_rx = controller.start(config, port, actuator)?;
    Ok((controller, records_rx))
}
