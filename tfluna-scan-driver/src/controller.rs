use crate::actuator::{switch_off, Actuator};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::position::PositionStore;
use crate::sampler::{SamplerReport, ScanSampler};
use crate::serial::ByteSource;
use crate::stop::StopSignal;
use crate::trajectory::{SweepReport, TrajectoryGenerator};
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info, warn};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tfluna_scan_data::ScanRecord;

type BoxedActuator = Box<dyn Actuator + Send>;
type BoxedSource = Box<dyn ByteSource + Send>;

/// Lifecycle of a scan session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    /// Both loops were asked to stop and are being joined.
    Stopping,
}

/// What a finished session did.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// `None` if the trajectory thread panicked.
    pub sweep: Option<SweepReport>,
    /// `None` if the sampler thread panicked.
    pub sampler: Option<SamplerReport>,
    /// Loop errors and shutdown errors, in the order they were collected.
    pub faults: Vec<ScanError>,
}

impl SessionReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

struct ScanThreads {
    trajectory_thread: JoinHandle<(BoxedActuator, Result<SweepReport, ScanError>)>,
    sampler_thread: JoinHandle<(BoxedSource, Result<SamplerReport, ScanError>)>,
}

struct Session {
    state: SessionState,
    threads: Option<ScanThreads>,
    run_duration: Option<Duration>,
    poll_interval: Duration,
}

/// Owns the trajectory and sampler threads of a scan session.
///
/// All methods take `&self`, so the controller can be shared behind an `Arc`
/// and stopped from a different thread than the one that started it.
pub struct ScanController {
    session: Mutex<Session>,
    idle: Condvar,
    stop: StopSignal,
}

impl Default for ScanController {
    fn default() -> Self {
        ScanController::new()
    }
}

impl ScanController {
    pub fn new() -> Self {
        ScanController {
            session: Mutex::new(Session {
                state: SessionState::Idle,
                threads: None,
                run_duration: None,
                poll_interval: Duration::ZERO,
            }),
            idle: Condvar::new(),
            stop: StopSignal::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Handle that requests a stop without performing it, e.g. from an
    /// interrupt handler. The next [`ScanController::wait`] does the shutdown.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Validate `config` and launch the trajectory and sampler threads.
    ///
    /// Returns the receiving end of the scan record stream.
    pub fn start<S, A>(
        &self,
        config: ScanConfig,
        source: S,
        actuator: A,
    ) -> Result<Receiver<ScanRecord>, ScanError>
    where
        S: ByteSource + Send + 'static,
        A: Actuator + Send + 'static,
    {
        let mut session = self.lock();
        if session.state != SessionState::Idle {
            return Err(ScanError::AlreadyRunning);
        }
        config.validate()?;

        let store = PositionStore::new(config.initial_setpoint());
        self.stop.reset();
        let (records_tx, records_rx) = unbounded();

        let mut sampler = ScanSampler::new(
            &config,
            Box::new(source) as BoxedSource,
            store.clone(),
            self.stop.clone(),
            records_tx,
        );
        let sampler_thread = thread::Builder::new()
            .name("tfluna-sampler".into())
            .spawn(move || {
                let result = sampler.run();
                (sampler.into_source(), result)
            })?;

        session.run_duration = config.run_duration();
        session.poll_interval = config.poll_interval();
        let mut generator = TrajectoryGenerator::new(
            config,
            Box::new(actuator) as BoxedActuator,
            store,
            self.stop.clone(),
        );
        let trajectory_thread = match thread::Builder::new()
            .name("tfluna-trajectory".into())
            .spawn(move || {
                let result = generator.run();
                (generator.into_actuator(), result)
            }) {
            Ok(handle) => handle,
            Err(e) => {
                self.stop.raise();
                if sampler_thread.join().is_err() {
                    warn!("Sampler thread panicked");
                }
                return Err(e.into());
            }
        };

        session.threads = Some(ScanThreads {
            trajectory_thread,
            sampler_thread,
        });
        session.state = SessionState::Running;
        info!("Scan session started");
        Ok(records_rx)
    }

    /// Stop the running session and wait for both threads to exit, then
    /// switch the servos off and release the byte stream.
    ///
    /// Returns `None` if no session was running. A caller arriving while
    /// another one is stopping the session waits for it to finish.
    pub fn stop(&self) -> Option<SessionReport> {
        let threads = {
            let mut session = self.lock();
            while session.state == SessionState::Stopping {
                session = self
                    .idle
                    .wait(session)
                    .unwrap_or_else(|e| e.into_inner());
            }
            if session.state == SessionState::Idle {
                return None;
            }
            session.state = SessionState::Stopping;
            self.stop.raise();
            session.threads.take()
        };
        info!("Stopping scan session");

        let mut report = SessionReport::default();
        if let Some(threads) = threads {
            join(threads, &mut report);
        }

        let mut session = self.lock();
        session.state = SessionState::Idle;
        self.idle.notify_all();
        info!("Scan session stopped");
        Some(report)
    }

    /// Block until the session ends on its own, a stop is requested or the
    /// configured run duration elapses, then [`stop`](ScanController::stop) it.
    pub fn wait(&self) -> Option<SessionReport> {
        let (run_duration, poll_interval) = {
            let session = self.lock();
            if session.state == SessionState::Idle {
                return None;
            }
            (session.run_duration, session.poll_interval)
        };

        match run_duration {
            Some(duration) => {
                if !self.stop.sleep(duration, poll_interval) {
                    info!("Run duration of {:?} elapsed", duration);
                }
            }
            None => {
                while !self.stop.is_raised() {
                    thread::sleep(poll_interval);
                }
            }
        }
        self.stop()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn join(threads: ScanThreads, report: &mut SessionReport) {
    let actuator = match threads.trajectory_thread.join() {
        Ok((actuator, result)) => {
            match result {
                Ok(sweep) => report.sweep = Some(sweep),
                Err(e) => report.faults.push(e),
            }
            Some(actuator)
        }
        Err(_) => {
            report.faults.push(ScanError::ThreadPanicked("trajectory"));
            None
        }
    };
    let source = match threads.sampler_thread.join() {
        Ok((source, result)) => {
            match result {
                Ok(sampler) => report.sampler = Some(sampler),
                Err(e) => report.faults.push(e),
            }
            Some(source)
        }
        Err(_) => {
            report.faults.push(ScanError::ThreadPanicked("sampler"));
            None
        }
    };

    if let Some(mut actuator) = actuator {
        if let Err(e) = switch_off(&mut actuator) {
            warn!("Failed to switch the servos off: {e}");
            report.faults.push(e);
        }
    }
    drop(source);
    debug!("Released the byte stream");
}

/// A dropped controller stops its session.
impl Drop for ScanController {
    fn drop(&mut self) {
        self.stop();
    }
}
