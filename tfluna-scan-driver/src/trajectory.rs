use crate::actuator::Actuator;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::position::PositionStore;
use crate::stop::StopSignal;
use log::{debug, error, info};
use std::time::Duration;
use tfluna_scan_data::{Axis, PanTiltSetpoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanDirection {
    /// From `pan_min` towards `pan_max`
    Forward,
    /// From `pan_max` towards `pan_min`
    Reverse,
}

impl PanDirection {
    fn flipped(self) -> Self {
        match self {
            PanDirection::Forward => PanDirection::Reverse,
            PanDirection::Reverse => PanDirection::Forward,
        }
    }
}

/// One servo command of the sweep and the dwell that follows it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepCommand {
    /// Axis that moves with this command.
    pub axis: Axis,
    /// Full position after the command.
    pub setpoint: PanTiltSetpoint,
    pub dwell: Duration,
    /// Index of the tilt row the command belongs to.
    pub row: u32,
    pub direction: PanDirection,
    /// Last pan column of the row.
    pub ends_row: bool,
}

struct SweepState {
    row: u32,
    direction: PanDirection,
    step: u32,
    row_started: bool,
    setpoint: PanTiltSetpoint,
}

/// Boustrophedon path over tilt rows and pan columns.
///
/// Each row starts with a tilt command followed by `pan_steps + 1` pan
/// commands. Even rows pan forward from `pan_min`, odd rows pan back from
/// `pan_max`.
pub struct SweepPlan {
    tilt_start: u32,
    tilt_step: u32,
    n_rows: u32,
    pan_min: u32,
    pan_max: u32,
    pan_steps: u32,
    pan_column_size: u32,
    settle_delay_row: Duration,
    step_delay: Duration,
    state: SweepState,
}

impl SweepPlan {
    pub fn new(config: &ScanConfig) -> Self {
        SweepPlan {
            tilt_start: config.tilt_start,
            tilt_step: config.tilt_step,
            n_rows: config.n_rows(),
            pan_min: config.pan_min,
            pan_max: config.pan_max,
            pan_steps: config.pan_steps,
            pan_column_size: config.pan_column_size(),
            settle_delay_row: config.settle_delay_row(),
            step_delay: config.step_delay(),
            state: SweepState {
                row: 0,
                direction: PanDirection::Forward,
                step: 0,
                row_started: false,
                setpoint: config.initial_setpoint(),
            },
        }
    }

    pub fn n_rows(&self) -> u32 {
        self.n_rows
    }

    fn pan_at(&self, step: u32) -> u32 {
        let offset = step * self.pan_column_size;
        match self.state.direction {
            PanDirection::Forward => self.pan_min + offset,
            PanDirection::Reverse => self.pan_max - offset,
        }
    }
}

impl Iterator for SweepPlan {
    type Item = SweepCommand;

    fn next(&mut self) -> Option<SweepCommand> {
        if self.state.row >= self.n_rows {
            return None;
        }
        let row = self.state.row;
        let direction = self.state.direction;

        if !self.state.row_started {
            // row < n_rows keeps this within tilt_end
            let tilt = self.tilt_start + row * self.tilt_step;
            self.state.setpoint = self.state.setpoint.with_tilt(tilt);
            self.state.row_started = true;
            self.state.step = 0;
            return Some(SweepCommand {
                axis: Axis::Tilt,
                setpoint: self.state.setpoint,
                dwell: self.settle_delay_row,
                row,
                direction,
                ends_row: false,
            });
        }

        let pan = self.pan_at(self.state.step);
        self.state.setpoint = self.state.setpoint.with_pan(pan);
        self.state.step += 1;
        let ends_row = self.state.step > self.pan_steps;
        if ends_row {
            self.state.row += 1;
            self.state.row_started = false;
            self.state.direction = direction.flipped();
        }
        Some(SweepCommand {
            axis: Axis::Pan,
            setpoint: self.state.setpoint,
            dwell: self.step_delay,
            row,
            direction,
            ends_row,
        })
    }
}

/// Summary of a finished or interrupted sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rows_completed: u32,
    pub setpoints_commanded: u64,
    /// Every row of the plan was visited.
    pub completed: bool,
}

/// Drives the actuator along a [`SweepPlan`] and publishes every commanded
/// setpoint to the [`PositionStore`].
pub struct TrajectoryGenerator<A: Actuator> {
    config: ScanConfig,
    actuator: A,
    store: PositionStore,
    stop: StopSignal,
}

impl<A: Actuator> TrajectoryGenerator<A> {
    pub fn new(config: ScanConfig, actuator: A, store: PositionStore, stop: StopSignal) -> Self {
        TrajectoryGenerator {
            config,
            actuator,
            store,
            stop,
        }
    }

    /// Run the sweep until it completes or the stop signal is raised.
    ///
    /// An actuator failure raises the stop signal so the sampler winds down too.
    pub fn run(&mut self) -> Result<SweepReport, ScanError> {
        let mut report = SweepReport::default();
        match self.sweep(&mut report) {
            Ok(()) => Ok(report),
            Err(e) => {
                error!("Sweep aborted: {e}");
                self.stop.raise();
                Err(e)
            }
        }
    }

    fn sweep(&mut self, report: &mut SweepReport) -> Result<(), ScanError> {
        let plan = SweepPlan::new(&self.config);
        let n_rows = plan.n_rows();
        let poll_interval = self.config.poll_interval();
        info!("Sweeping {} rows of {} columns", n_rows, self.config.pan_steps + 1);

        for command in plan {
            if self.stop.is_raised() {
                debug!("Sweep stopped at {:?}", self.store.snapshot());
                return Ok(());
            }
            self.actuator
                .set_axis(command.axis, command.setpoint.get(command.axis))?;
            self.store.update(command.setpoint);
            report.setpoints_commanded += 1;

            if command.axis == Axis::Tilt {
                debug!(
                    "Row {}/{} at tilt {}, panning {:?}",
                    command.row + 1,
                    n_rows,
                    command.setpoint.tilt,
                    command.direction
                );
            }

            if self.stop.sleep(command.dwell, poll_interval) {
                debug!("Sweep stopped at {:?}", command.setpoint);
                return Ok(());
            }
            if command.ends_row {
                report.rows_completed += 1;
            }
        }

        report.completed = true;
        info!("Sweep complete after {} rows", report.rows_completed);
        if self.config.stop_when_sweep_complete {
            self.stop.raise();
        }
        Ok(())
    }

    pub fn into_actuator(self) -> A {
        self.actuator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::switch_off;
    use crate::test_support::{fast_config, FailingActuator, RecordingActuator};
    use proptest::prelude::*;

    fn rows(plan: SweepPlan) -> Vec<(SweepCommand, Vec<SweepCommand>)> {
        let mut rows: Vec<(SweepCommand, Vec<SweepCommand>)> = Vec::new();
        for command in plan {
            match command.axis {
                Axis::Tilt => rows.push((command, Vec::new())),
                Axis::Pan => rows.last_mut().unwrap().1.push(command),
            }
        }
        rows
    }

    proptest! {
        #[test]
        fn test_plan_shape(
            tilt_start in 0..3000u32,
            tilt_span in 0..300u32,
            tilt_step in 1..100u32,
            pan_min in 0..2000u32,
            pan_span in 1..1000u32,
            pan_steps in 1..50u32,
        ) {
            let tilt_end = tilt_start + tilt_span;
            let pan_max = pan_min + pan_span;
            let pan_steps = pan_steps.min(pan_span);
            let config = ScanConfig {
                tilt_start,
                tilt_end,
                tilt_step,
                pan_min,
                pan_max,
                pan_steps,
                ..Default::default()
            };
            prop_assert_eq!(config.validate(), Ok(()));
            let rows = rows(SweepPlan::new(&config));

            prop_assert_eq!(rows.len() as u32, tilt_span / tilt_step + 1);
            for (i, (tilt, pans)) in rows.iter().enumerate() {
                prop_assert_eq!(tilt.setpoint.tilt, tilt_start + i as u32 * tilt_step);
                prop_assert!(tilt.setpoint.tilt <= tilt_end);
                prop_assert_eq!(pans.len() as u32, pan_steps + 1);
                prop_assert!(pans.iter().all(|p| p.setpoint.tilt == tilt.setpoint.tilt));
                prop_assert!(pans
                    .iter()
                    .all(|p| pan_min <= p.setpoint.pan && p.setpoint.pan <= pan_max));
                prop_assert!(pans.last().unwrap().ends_row);
                prop_assert_eq!(pans.iter().filter(|p| p.ends_row).count(), 1);

                let first = pans.first().unwrap().setpoint.pan;
                let last = pans.last().unwrap().setpoint.pan;
                if i % 2 == 0 {
                    prop_assert_eq!(first, pan_min);
                    prop_assert!(first < last);
                } else {
                    prop_assert_eq!(first, pan_max);
                    prop_assert!(first > last);
                }
            }
        }
    }

    #[test]
    fn test_plan_columns() {
        let config = ScanConfig {
            tilt_start: 2000,
            tilt_end: 2050,
            tilt_step: 50,
            pan_min: 500,
            pan_max: 2000,
            pan_steps: 4,
            ..Default::default()
        };
        let rows = rows(SweepPlan::new(&config));
        let pans = |i: usize| {
            rows[i]
                .1
                .iter()
                .map(|p| p.setpoint.pan)
                .collect::<Vec<_>>()
        };
        assert_eq!(pans(0), vec![500, 875, 1250, 1625, 2000]);
        assert_eq!(pans(1), vec![2000, 1625, 1250, 875, 500]);
        assert_eq!(rows[0].1[0].direction, PanDirection::Forward);
        assert_eq!(rows[1].1[0].direction, PanDirection::Reverse);
    }

    #[test]
    fn test_plan_tilt_keeps_previous_pan() {
        let config = ScanConfig {
            tilt_start: 2000,
            tilt_end: 2050,
            tilt_step: 50,
            pan_min: 500,
            pan_max: 2000,
            pan_steps: 4,
            ..Default::default()
        };
        let commands = SweepPlan::new(&config).collect::<Vec<_>>();
        assert_eq!(commands[0].setpoint, PanTiltSetpoint::new(500, 2000));
        assert_eq!(commands[0].dwell, Duration::from_millis(900));
        assert_eq!(commands[1].dwell, Duration::from_millis(100));
        // the second tilt command is issued where the first row ended
        assert_eq!(commands[6].axis, Axis::Tilt);
        assert_eq!(commands[6].setpoint, PanTiltSetpoint::new(2000, 2050));
        assert_eq!(commands.len(), 12);
    }

    #[test]
    fn test_plan_empty_when_tilt_reversed() {
        let config = ScanConfig {
            tilt_start: 2500,
            tilt_end: 2000,
            ..Default::default()
        };
        assert_eq!(SweepPlan::new(&config).count(), 0);
    }

    #[test]
    fn test_plan_near_u32_max() {
        let config = ScanConfig {
            tilt_start: u32::MAX - 10,
            tilt_end: u32::MAX,
            tilt_step: 8,
            pan_steps: 1,
            ..Default::default()
        };
        assert_eq!(rows(SweepPlan::new(&config)).len(), 2);
    }

    #[test]
    fn test_generator_runs_full_sweep() {
        let config = fast_config();
        let actuator = RecordingActuator::new();
        let store = PositionStore::new(config.initial_setpoint());
        let stop = StopSignal::new();
        let expected = SweepPlan::new(&config).collect::<Vec<_>>();

        let mut generator =
            TrajectoryGenerator::new(config.clone(), actuator.clone(), store.clone(), stop.clone());
        let report = generator.run().unwrap();

        assert!(report.completed);
        assert_eq!(report.rows_completed, config.n_rows());
        assert_eq!(report.setpoints_commanded, expected.len() as u64);
        assert_eq!(
            actuator.commands(),
            expected
                .iter()
                .map(|c| (c.axis, c.setpoint.get(c.axis)))
                .collect::<Vec<_>>()
        );
        assert_eq!(store.snapshot(), expected.last().unwrap().setpoint);
        assert!(stop.is_raised());
    }

    #[test]
    fn test_standalone_sweep_ends_switched_off() {
        let config = fast_config();
        let mut generator = TrajectoryGenerator::new(
            config.clone(),
            RecordingActuator::new(),
            PositionStore::new(config.initial_setpoint()),
            StopSignal::new(),
        );
        assert!(generator.run().unwrap().completed);

        let mut actuator = generator.into_actuator();
        switch_off(&mut actuator).unwrap();
        let commands = actuator.commands();
        assert_eq!(
            commands[commands.len() - 2..],
            [(Axis::Pan, 0), (Axis::Tilt, 0)]
        );
    }

    #[test]
    fn test_generator_keeps_running_flag_when_asked() {
        let config = ScanConfig {
            stop_when_sweep_complete: false,
            ..fast_config()
        };
        let stop = StopSignal::new();
        let mut generator = TrajectoryGenerator::new(
            config.clone(),
            RecordingActuator::new(),
            PositionStore::new(config.initial_setpoint()),
            stop.clone(),
        );
        assert!(generator.run().unwrap().completed);
        assert!(!stop.is_raised());
    }

    #[test]
    fn test_generator_stopped_before_start() {
        let config = fast_config();
        let actuator = RecordingActuator::new();
        let store = PositionStore::new(config.initial_setpoint());
        let stop = StopSignal::new();
        stop.raise();

        let mut generator =
            TrajectoryGenerator::new(config.clone(), actuator.clone(), store.clone(), stop);
        let report = generator.run().unwrap();

        assert!(!report.completed);
        assert_eq!(report.setpoints_commanded, 0);
        assert!(actuator.commands().is_empty());
        assert_eq!(store.snapshot(), config.initial_setpoint());
    }

    #[test]
    fn test_generator_stops_during_dwell() {
        let config = ScanConfig {
            settle_delay_row_ms: 10_000,
            ..fast_config()
        };
        let actuator = RecordingActuator::new();
        let store = PositionStore::new(config.initial_setpoint());
        let stop = StopSignal::new();

        let handle = stop.clone();
        let raiser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            handle.raise();
        });

        let mut generator =
            TrajectoryGenerator::new(config.clone(), actuator.clone(), store.clone(), stop);
        let report = generator.run().unwrap();
        raiser.join().unwrap();

        // only the first tilt command went out, and it stays standing
        assert!(!report.completed);
        assert_eq!(actuator.commands(), vec![(Axis::Tilt, config.tilt_start)]);
        assert_eq!(store.snapshot(), config.initial_setpoint());
    }

    #[test]
    fn test_generator_actuator_failure_raises_stop() {
        let config = fast_config();
        let stop = StopSignal::new();
        let mut generator = TrajectoryGenerator::new(
            config.clone(),
            FailingActuator,
            PositionStore::new(config.initial_setpoint()),
            stop.clone(),
        );
        assert!(matches!(
            generator.run(),
            Err(ScanError::ActuatorError(_))
        ));
        assert!(stop.is_raised());
    }
}
