use crate::config::ScanConfig;
use crate::decoder::{DecodeOutcome, FrameDecoder};
use crate::error::ScanError;
use crate::position::PositionStore;
use crate::serial::ByteSource;
use crate::stop::StopSignal;
use crossbeam_channel::Sender;
use log::{debug, error, trace};
use tfluna_scan_data::{MeasurementFrame, ScanRecord};

/// Acceptance rule for sensor readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalFilter {
    pub strength_threshold: u16,
    pub distance_ceiling_cm: u16,
    pub require_checksum: bool,
}

impl SignalFilter {
    pub fn from_config(config: &ScanConfig) -> Self {
        SignalFilter {
            strength_threshold: config.strength_threshold,
            distance_ceiling_cm: config.distance_ceiling_cm,
            require_checksum: config.require_checksum,
        }
    }

    /// Weak returns and out-of-range distances are sensor noise.
    pub fn accepts(&self, frame: &MeasurementFrame) -> bool {
        frame.signal_strength > self.strength_threshold
            && frame.distance_cm < self.distance_ceiling_cm
            && (frame.checksum_correct || !self.require_checksum)
    }
}

/// Counters of a finished sampler run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SamplerReport {
    pub frames_decoded: u64,
    pub windows_discarded: u64,
    pub frames_rejected: u64,
    pub records_emitted: u64,
}

/// Pairs every accepted frame with the servo position and emits a [`ScanRecord`].
pub struct ScanSampler<S: ByteSource> {
    decoder: FrameDecoder<S>,
    filter: SignalFilter,
    store: PositionStore,
    stop: StopSignal,
    records_tx: Sender<ScanRecord>,
}

impl<S: ByteSource> ScanSampler<S> {
    pub fn new(
        config: &ScanConfig,
        source: S,
        store: PositionStore,
        stop: StopSignal,
        records_tx: Sender<ScanRecord>,
    ) -> Self {
        ScanSampler {
            decoder: FrameDecoder::new(source, config.resync, config.poll_interval()),
            filter: SignalFilter::from_config(config),
            store,
            stop,
            records_tx,
        }
    }

    /// Sample until the stop signal is raised.
    ///
    /// A closed byte stream or a dropped record receiver ends the run with an
    /// error and raises the stop signal so the sweep winds down too.
    pub fn run(&mut self) -> Result<SamplerReport, ScanError> {
        let mut report = SamplerReport::default();
        match self.sample(&mut report) {
            Ok(()) => {
                debug!("Sampler stopped: {:?}", report);
                Ok(report)
            }
            Err(e) => {
                error!("Sampler aborted: {e}");
                self.stop.raise();
                Err(e)
            }
        }
    }

    fn sample(&mut self, report: &mut SamplerReport) -> Result<(), ScanError> {
        loop {
            let frame = match self.decoder.next_frame(&self.stop)? {
                DecodeOutcome::Frame(frame) => frame,
                DecodeOutcome::Discarded => {
                    report.windows_discarded += 1;
                    continue;
                }
                DecodeOutcome::Stopped => return Ok(()),
            };
            // Taken after the frame was fully read, never older than the reading.
            let position = self.store.snapshot();
            report.frames_decoded += 1;

            if !self.filter.accepts(&frame) {
                trace!("Rejected {:?}", frame);
                report.frames_rejected += 1;
                continue;
            }

            let record = ScanRecord::new(position, frame.distance_cm);
            self.records_tx
                .send(record)
                .map_err(|_| ScanError::SinkClosed)?;
            report.records_emitted += 1;
        }
    }

    pub fn into_source(self) -> S {
        self.decoder.into_source()
    }
}
