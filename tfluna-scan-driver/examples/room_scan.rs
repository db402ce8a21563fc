use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::Write;
use tfluna_scan_data::{Axis, PanTiltSetpoint};
use tfluna_scan_driver::{
    open_port, run_scanner, switch_off, Actuator, FrameDecoder, LogActuator, PositionStore,
    ScanConfig, ScanError, StopSignal, TrajectoryGenerator,
};

#[derive(Parser)]
#[command(about = "Maps a room with a TF-Luna LiDAR on a pan/tilt bracket.")]
struct Cli {
    /// TOML file overriding the default scan settings
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Serial port the TF-Luna is attached to
    #[arg(long)]
    port: Option<String>,

    /// Stop after this many milliseconds
    #[arg(long)]
    duration_ms: Option<u64>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Sweep the servos while sampling the sensor
    Scan {
        /// Print records as JSON lines instead of CSV
        #[arg(long)]
        json: bool,
    },
    /// Sweep the servos without reading the sensor
    Sweep,
    /// Print every frame the sensor sends
    Monitor,
}

struct SweepLogger<A: Actuator>(A);

impl<A: Actuator> Actuator for SweepLogger<A> {
    fn set_axis(&mut self, axis: Axis, pulse_width: u32) -> Result<(), ScanError> {
        // both axes share the same pulse width to angle mapping
        let (degree, _) = PanTiltSetpoint::new(pulse_width, pulse_width).to_degrees();
        info!("{:?}: {} us ({:.1} deg)", axis, pulse_width, degree);
        self.0.set_axis(axis, pulse_width)
    }
}

fn load_config(cli: &Cli) -> Result<ScanConfig, ScanError> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(port) = &cli.port {
        config.port_name = port.clone();
    }
    if cli.duration_ms.is_some() {
        config.run_duration_ms = cli.duration_ms;
    }
    Ok(config)
}

fn scan(config: ScanConfig, json: bool) -> Result<(), ScanError> {
    let (controller, records_rx) = run_scanner(config, LogActuator)?;

    let printer = std::thread::spawn(move || {
        let stdout = std::io::stdout();
        for record in records_rx.iter() {
            let mut out = stdout.lock();
            let res = if json {
                match serde_json::to_string(&record) {
                    Ok(line) => writeln!(out, "{}", line),
                    Err(e) => Err(e.into()),
                }
            } else {
                writeln!(out, "{}", record)
            };
            if res.and_then(|_| out.flush()).is_err() {
                break;
            }
        }
    });

    if let Some(report) = controller.wait() {
        for fault in report.faults.iter() {
            error!("{fault}");
        }
        info!("Sweep: {:?}", report.sweep);
        info!("Sampler: {:?}", report.sampler);
    }
    drop(controller);
    if printer.join().is_err() {
        error!("Output thread panicked");
    }
    Ok(())
}

fn sweep(config: ScanConfig) -> Result<(), ScanError> {
    config.validate()?;
    let store = PositionStore::new(config.initial_setpoint());
    let stop = StopSignal::new();
    let mut generator = TrajectoryGenerator::new(config, SweepLogger(LogActuator), store, stop);
    let result = generator.run();
    switch_off(&mut generator.into_actuator())?;
    info!("Sweep finished: {:?}", result?);
    Ok(())
}

fn monitor(config: ScanConfig) -> Result<(), ScanError> {
    config.validate()?;
    let port = open_port(&config.port_name, config.baud_rate)?;
    let mut decoder = FrameDecoder::new(port, config.resync, config.poll_interval());
    let stop = StopSignal::new();

    if let Some(duration) = config.run_duration() {
        let watchdog_stop = stop.clone();
        std::thread::spawn(move || {
            std::thread::sleep(duration);
            watchdog_stop.raise();
        });
    }

    for frame in decoder.frames(&stop) {
        let frame = frame?;
        println!(
            "Distance: {} cm | Strength: {} | Temp: {:.2} C",
            frame.distance_cm, frame.signal_strength, frame.temperature_c
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| match cli.mode {
        Mode::Scan { json } => scan(config, json),
        Mode::Sweep => sweep(config),
        Mode::Monitor => monitor(config),
    });
    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
