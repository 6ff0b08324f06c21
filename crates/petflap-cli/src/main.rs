//! Host emulator for the pet door controller.
//!
//! Runs the controller against simulated door hardware. The EEPROM is kept
//! in an image file, and the diagnostic serial link is wired either to
//! stdin/stdout or to a real serial port (`--port`). Logs go to stderr and
//! are filtered with `RUST_LOG` (default `info`).
//!
//! ```text
//! $ printf 'M\x03S' | petflap --eeprom door.bin
//! READY: Pet door serial interface
//! ...
//! ```

mod actuator;
mod args;
mod paced;

use actuator::TraceActuator;
use anyhow::{Context, Result};
use args::{Args, USAGE};
use paced::PacedClock;
use petflap_controller::{Controller, ControllerState, FlapConfig, ModeTransition, Peripherals};
use petflap_core::{OperatingMode, VERSION, constants::DATA_BYTES};
use petflap_hardware::{
    FileEeprom, HardwareError,
    mock::{SimClock, SimPanel, SimTransponder, SimTransponderHandle},
};
use petflap_protocol::{RingLink, RxFeeder};
use serde::Serialize;
use std::{
    env, fs,
    io::{self, Read, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type HostLink = RingLink<Box<dyn Write + Send>>;
type HostController = Controller<
    SimTransponder,
    TraceActuator<PacedClock>,
    FileEeprom,
    SimPanel,
    HostLink,
    PacedClock,
>;

/// Poll interval while the receive ring is full or the port is idle.
const FEED_BACKOFF: Duration = Duration::from_millis(1);

/// Final report written to stderr on shutdown.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    version: &'static str,
    mode: OperatingMode,
    state: &'a ControllerState,
    transitions: Vec<ModeTransition>,
    eeprom_writes: u64,
    rx_overflows: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = Args::parse(env::args().skip(1))? else {
        println!("petflap {VERSION}\n{USAGE}");
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    info!(version = VERSION, "Starting pet door emulator");

    let config = load_config(&args)?;
    let eeprom = FileEeprom::open(&args.eeprom)
        .with_context(|| format!("opening EEPROM image {}", args.eeprom.display()))?;

    let sim = SimClock::new();
    let clock = PacedClock::new(sim.clone());
    let (reader, tag) = SimTransponder::new(sim);
    let (panel, _panel) = SimPanel::new();
    let stop = Arc::new(AtomicBool::new(false));

    let (serial, feeder) = match &args.port {
        Some(device) => open_port(device, args.baud, Arc::clone(&stop))?,
        None => {
            let (link, feeder) = RingLink::new(Box::new(io::stdout()) as Box<dyn Write + Send>);
            let input = feeder.clone();
            // Detached: a blocked stdin read must not hold up shutdown.
            thread::spawn(move || {
                if let Err(error) = feed(io::stdin().lock(), &input, None) {
                    warn!(%error, "stdin reader stopped");
                }
            });
            (link, feeder)
        }
    };

    let peripherals = Peripherals {
        reader,
        actuator: TraceActuator::new(clock.clone()),
        memory: eeprom,
        panel,
        serial,
    };
    let controller = Controller::new(config, clock, peripherals);

    let present = args.present_tag;
    let running = Arc::clone(&stop);
    let worker =
        tokio::task::spawn_blocking(move || run(controller, &tag, present, &running));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("Shutting down");
    stop.store(true, Ordering::SeqCst);

    let mut controller = worker.await.context("controller thread panicked")??;
    controller
        .store_mut()
        .memory_mut()
        .flush()
        .context("flushing EEPROM image")?;

    let transitions = controller.modes().history().iter().copied().collect();
    let summary = Summary {
        version: VERSION,
        mode: controller.mode(),
        state: controller.state(),
        transitions,
        eeprom_writes: controller.store().memory().write_count(),
        rx_overflows: feeder.stats().overflows,
    };
    eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_config(args: &Args) -> Result<FlapConfig> {
    let Some(path) = &args.config else {
        return Ok(FlapConfig::default());
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = FlapConfig::from_json(&json)
        .with_context(|| format!("loading configuration {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Open `device` and start a reader thread feeding the receive ring.
fn open_port(device: &str, baud: u32, stop: Arc<AtomicBool>) -> Result<(HostLink, RxFeeder)> {
    let port = serialport::new(device, baud)
        .timeout(Duration::from_millis(10))
        .open()
        .map_err(|e| port_error(device, &e))?;
    let writer = port.try_clone().map_err(|e| port_error(device, &e))?;
    info!(device, baud, "Serial port open");

    let (link, feeder) = RingLink::new(Box::new(writer) as Box<dyn Write + Send>);
    let input = feeder.clone();
    thread::spawn(move || {
        if let Err(error) = feed(port, &input, Some(&stop)) {
            warn!(%error, "Serial port reader stopped");
        }
    });
    Ok((link, feeder))
}

fn port_error(device: &str, error: &serialport::Error) -> HardwareError {
    HardwareError::serial_port(format!("{device}: {error}"))
}

/// Copy bytes from `source` into the receive ring until end of input or
/// until `stop` is set.
///
/// Waits for room instead of overflowing the ring; read timeouts are idle
/// polls.
fn feed<R: Read>(mut source: R, feeder: &RxFeeder, stop: Option<&AtomicBool>) -> io::Result<()> {
    let stopped = || stop.is_some_and(|flag| flag.load(Ordering::SeqCst));
    let mut buf = [0u8; 64];
    while !stopped() {
        let n = match source.read(&mut buf) {
            Ok(0) => {
                debug!("Serial input closed");
                return Ok(());
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for &byte in &buf[..n] {
            while !feeder.has_room() {
                if stopped() {
                    return Ok(());
                }
                thread::sleep(FEED_BACKOFF);
            }
            feeder.push(byte);
        }
    }
    Ok(())
}

/// Boot and run scheduler passes until `stop` is set.
fn run(
    mut controller: HostController,
    tag: &SimTransponderHandle,
    present: Option<[u8; DATA_BYTES]>,
    stop: &AtomicBool,
) -> Result<HostController> {
    controller.boot();

    if let Some(data) = present {
        info!("Presenting tag for one pass");
        tag.present_tag(data);
        controller.tick();
        tag.remove_tag();
    }

    while !stop.load(Ordering::SeqCst) {
        controller.tick();
        controller
            .store_mut()
            .memory_mut()
            .flush()
            .context("flushing EEPROM image")?;
    }
    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflap_protocol::RX_BUFFER_SIZE;

    #[test]
    fn test_missing_serial_device_is_a_port_error() {
        let stop = Arc::new(AtomicBool::new(false));
        let Err(error) = open_port("/dev/petflap-missing", args::DEFAULT_BAUD, stop) else {
            panic!("opening a missing device succeeded");
        };
        let error = error
            .downcast::<HardwareError>()
            .expect("serial failures are hardware errors");
        assert!(matches!(error, HardwareError::SerialPort { .. }));
        assert!(error.to_string().contains("/dev/petflap-missing"), "{error}");
    }

    #[test]
    fn test_feed_copies_until_end_of_input() {
        let (_link, feeder) = RingLink::new(Vec::new());
        feed(&b"S"[..], &feeder, None).unwrap();
        assert_eq!(feeder.stats().overflows, 0);
    }

    #[test]
    fn test_feed_waits_for_room_instead_of_dropping() {
        let (_link, feeder) = RingLink::new(Vec::new());
        let stop = AtomicBool::new(false);
        let input = vec![b'L'; RX_BUFFER_SIZE * 2];
        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(20));
                stop.store(true, Ordering::SeqCst);
            });
            feed(&input[..], &feeder, Some(&stop)).unwrap();
        });
        assert!(!feeder.has_room());
        assert_eq!(feeder.stats().overflows, 0);
    }

    #[test]
    fn test_run_boots_before_checking_stop() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimClock::new();
        let clock = PacedClock::new(sim.clone());
        let (reader, tag) = SimTransponder::new(sim);
        let (panel, _panel) = SimPanel::new();
        let (serial, _feeder) = RingLink::new(Box::new(io::sink()) as Box<dyn Write + Send>);
        let peripherals = Peripherals {
            reader,
            actuator: TraceActuator::new(clock.clone()),
            memory: FileEeprom::open(dir.path().join("door.bin")).unwrap(),
            panel,
            serial,
        };
        let controller = Controller::new(FlapConfig::default(), clock, peripherals);

        let stop = AtomicBool::new(true);
        let controller = run(controller, &tag, None, &stop).unwrap();
        assert_eq!(controller.mode(), OperatingMode::Normal);
        assert!(controller.state().entry_locked);
        assert!(!controller.state().exit_locked);
    }
}
