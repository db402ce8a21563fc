use crate::config::ResyncPolicy;
use crate::constants::FRAME_SIZE;
use crate::error::ScanError;
use crate::frame::{decode_frame, find_start_index};
use crate::serial::ByteSource;
use crate::stop::StopSignal;
use log::trace;
use std::collections::VecDeque;
use std::time::Duration;
use tfluna_scan_data::MeasurementFrame;

/// Result of one decoder iteration.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeOutcome {
    Frame(MeasurementFrame),
    /// Bytes were dropped because they did not start with the frame marker.
    Discarded,
    /// The stop signal was raised while waiting for bytes.
    Stopped,
}

/// Extracts TF-Luna frames from a byte stream.
pub struct FrameDecoder<S: ByteSource> {
    source: S,
    policy: ResyncPolicy,
    poll_interval: Duration,
    buffer: VecDeque<u8>,
}

impl<S: ByteSource> FrameDecoder<S> {
    pub fn new(source: S, policy: ResyncPolicy, poll_interval: Duration) -> Self {
        FrameDecoder {
            source,
            policy,
            poll_interval,
            buffer: VecDeque::with_capacity(4 * FRAME_SIZE),
        }
    }

    /// Wait for the next frame window and decode it.
    ///
    /// Waiting polls the source every `poll_interval` and gives up as soon as
    /// `stop` is raised. Transport errors are returned as is.
    pub fn next_frame(&mut self, stop: &StopSignal) -> Result<DecodeOutcome, ScanError> {
        match self.policy {
            ResyncPolicy::DiscardWindow => self.next_window(stop),
            ResyncPolicy::ScanForMarker => self.next_marked(stop),
        }
    }

    /// Lazy sequence of decoded frames, skipping discarded windows.
    ///
    /// Ends when `stop` is raised. A transport error is yielded once and ends
    /// the sequence.
    pub fn frames<'a>(&'a mut self, stop: &'a StopSignal) -> Frames<'a, S> {
        Frames {
            decoder: self,
            stop,
            failed: false,
        }
    }

    /// Give back the byte source.
    pub fn into_source(self) -> S {
        self.source
    }

    fn next_window(&mut self, stop: &StopSignal) -> Result<DecodeOutcome, ScanError> {
        loop {
            if stop.is_raised() {
                return Ok(DecodeOutcome::Stopped);
            }
            if self.source.bytes_available()? >= FRAME_SIZE {
                break;
            }
            std::thread::sleep(self.poll_interval);
        }

        let mut raw = [0u8; FRAME_SIZE];
        self.source.read_bytes(&mut raw)?;
        Ok(to_outcome(&raw))
    }

    fn next_marked(&mut self, stop: &StopSignal) -> Result<DecodeOutcome, ScanError> {
        while self.buffer.len() < FRAME_SIZE {
            if stop.is_raised() {
                return Ok(DecodeOutcome::Stopped);
            }
            let n_read = self.source.bytes_available()?;
            if n_read == 0 {
                std::thread::sleep(self.poll_interval);
                continue;
            }
            let mut chunk = vec![0u8; n_read];
            self.source.read_bytes(&mut chunk)?;
            self.buffer.extend(chunk);
        }

        match find_start_index(&self.buffer) {
            Some(0) => {
                let mut raw = [0u8; FRAME_SIZE];
                for (dst, src) in raw.iter_mut().zip(self.buffer.drain(..FRAME_SIZE)) {
                    *dst = src;
                }
                Ok(to_outcome(&raw))
            }
            Some(start_index) => {
                trace!("Skipping {} bytes to the next frame marker", start_index);
                self.buffer.drain(..start_index);
                Ok(DecodeOutcome::Discarded)
            }
            None => {
                trace!("Skipping {} bytes without a frame marker", self.buffer.len());
                self.buffer.clear();
                Ok(DecodeOutcome::Discarded)
            }
        }
    }
}

fn to_outcome(raw: &[u8; FRAME_SIZE]) -> DecodeOutcome {
    match decode_frame(raw) {
        Ok(frame) => DecodeOutcome::Frame(frame),
        Err(e) => {
            trace!("Discarding frame window: {e}");
            DecodeOutcome::Discarded
        }
    }
}

/// Iterator returned by [`FrameDecoder::frames`].
pub struct Frames<'a, S: ByteSource> {
    decoder: &'a mut FrameDecoder<S>,
    stop: &'a StopSignal,
    failed: bool,
}

impl<'a, S: ByteSource> Iterator for Frames<'a, S> {
    type Item = Result<MeasurementFrame, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.decoder.next_frame(self.stop) {
                Ok(DecodeOutcome::Frame(frame)) => return Some(Ok(frame)),
                Ok(DecodeOutcome::Discarded) => continue,
                Ok(DecodeOutcome::Stopped) => return None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
