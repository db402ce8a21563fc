use crossbeam_utils::atomic::AtomicCell;
use std::sync::Arc;
use tfluna_scan_data::PanTiltSetpoint;

/// Shared cell holding the most recently commanded servo position.
///
/// Every `update` replaces the whole setpoint in a single atomic store and
/// every `snapshot` returns a setpoint exactly as some `update` wrote it, so
/// a reader never pairs the pan of one write with the tilt of another.
/// Clones share the same cell.
#[derive(Clone, Debug)]
pub struct PositionStore {
    current: Arc<AtomicCell<PanTiltSetpoint>>,
}

impl PositionStore {
    pub fn new(initial: PanTiltSetpoint) -> Self {
        PositionStore {
            current: Arc::new(AtomicCell::new(initial)),
        }
    }

    pub fn snapshot(&self) -> PanTiltSetpoint {
        self.current.load()
    }

    pub fn update(&self, setpoint: PanTiltSetpoint) {
        self.current.store(setpoint);
    }
}
