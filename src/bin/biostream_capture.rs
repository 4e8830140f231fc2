//! Biostream capture CLI
//!
//! This binary runs on your PC, reads the text stream of one of the
//! firmware variants from a serial port and writes it to CSV.
//!
//! ## Usage
//!
//! ```bash
//! # List available serial ports
//! cargo run --bin biostream_capture -- --list-ports
//!
//! # Capture the gated PPG stream (auto-detects the port)
//! cargo run --bin biostream_capture -- --variant ppg-gated
//!
//! # 5000 records of timestamped ECG from a specific port
//! cargo run --bin biostream_capture -- --port /dev/ttyUSB0 \
//!     --variant ecg-timestamped --count 5000 --output ecg.csv
//! ```
//!
//! ## CSV columns
//!
//! `host_ms,device_ms,value,red,ir,sentinel`. Columns that do not apply to
//! the variant are left empty. Banner and diagnostic lines are logged, not
//! written.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::Serialize;

use biostream::domain::ParseError;
use biostream::{ChannelOrder, LineFormat, Sample, StreamRecord, VariantConfig};

/// Raspberry Pi USB vendor id
const RASPBERRY_PI_VID: u16 = 0x2e8a;

/// Read timeout; a silent device is reported, not fatal
const READ_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Serial port (auto-detected when omitted)
    #[arg(short, long)]
    port: Option<String>,

    /// Firmware variant on the other end; sets baud rate and line format
    #[arg(long, value_parser = parse_variant, default_value = "ppg-raw")]
    variant: VariantConfig,

    /// Column order of optical lines, if it differs from the variant's
    #[arg(long, value_enum)]
    order: Option<Order>,

    /// CSV output file
    #[arg(short, long, default_value = "capture.csv")]
    output: String,

    /// Stop after this many records
    #[arg(short, long)]
    count: Option<u64>,

    /// Display more information on the console. Can be used multiple times.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Order {
    RedIr,
    IrRed,
}

impl From<Order> for ChannelOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::RedIr => ChannelOrder::RedIr,
            Order::IrRed => ChannelOrder::IrRed,
        }
    }
}

fn parse_variant(name: &str) -> Result<VariantConfig, String> {
    VariantConfig::by_name(name).ok_or_else(|| {
        let names: Vec<&str> = VariantConfig::ALL.iter().map(|v| v.name).collect();
        format!("unknown variant '{name}' (expected one of: {})", names.join(", "))
    })
}

/// One CSV row
#[derive(Debug, PartialEq, Serialize)]
struct CaptureRow {
    host_ms: u64,
    device_ms: Option<u64>,
    value: Option<u16>,
    red: Option<u32>,
    ir: Option<u32>,
    sentinel: bool,
}

impl CaptureRow {
    /// `gated` marks variants whose zero lines are sentinels rather than data
    fn new(host_ms: u64, record: &StreamRecord, gated: bool) -> Self {
        let (value, red, ir) = match record.sample {
            Sample::Single(value) => (Some(value), None, None),
            Sample::Pair(pair) => (None, Some(pair.red), Some(pair.ir)),
        };
        Self {
            host_ms,
            device_ms: record.timestamp_ms,
            value,
            red,
            ir,
            sentinel: gated && record.is_sentinel(),
        }
    }
}

/// Line format of the variant, with an optional channel order override
fn stream_format(variant: &VariantConfig, order: Option<Order>) -> LineFormat {
    match (variant.sampling.format, order) {
        (LineFormat::Pair(_), Some(order)) => LineFormat::Pair(order.into()),
        (format, _) => format,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if cli.list_ports {
        list_ports();
        return Ok(());
    }

    let variant = cli.variant;
    let format = stream_format(&variant, cli.order);
    let gated = variant.sampling.gates != biostream::Gates::NONE;

    let port_name = match cli.port.clone().or_else(find_device_port) {
        Some(name) => name,
        None => {
            eprintln!("Error: No serial device found");
            eprintln!("Use --list-ports to see available ports");
            eprintln!("Or specify port with --port <PORT>");
            bail!("no device found");
        }
    };

    // On Windows, COM ports >= 10 need the \\.\COMxx format
    #[cfg(target_os = "windows")]
    let port_name = if port_name.starts_with("COM") && !port_name.starts_with(r"\\") {
        format!(r"\\.\{}", port_name)
    } else {
        port_name
    };

    info!(
        "Capturing {} from {} at {} baud into {}",
        variant.name, port_name, variant.baud, cli.output
    );

    let port = serialport::new(&port_name, variant.baud)
        .timeout(READ_TIMEOUT)
        .flow_control(serialport::FlowControl::None)
        .open()
        .with_context(|| format!("opening {port_name}"))?;

    let file = File::create(&cli.output).with_context(|| format!("creating {}", cli.output))?;
    let mut writer = csv::Writer::from_writer(file);

    let written = capture(
        BufReader::new(port),
        &mut writer,
        format,
        gated,
        cli.count,
    )?;
    writer.flush()?;

    info!("Wrote {} records to {}", written, cli.output);
    Ok(())
}

/// Copy records from `reader` to `writer` until EOF or `limit`
fn capture<R: BufRead, W: Write>(
    mut reader: R,
    writer: &mut csv::Writer<W>,
    format: LineFormat,
    gated: bool,
    limit: Option<u64>,
) -> anyhow::Result<u64> {
    let started = Instant::now();
    let mut written = 0u64;
    let mut sentinels = 0u64;
    let mut raw = Vec::with_capacity(64);

    while limit.map_or(true, |limit| written < limit) {
        // A timeout can land mid-line; the bytes read so far stay in `raw`
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                warn!("No data for {:?}; is the variant right?", READ_TIMEOUT);
                continue;
            }
            Err(e) => return Err(e).context("reading serial port"),
        }

        let line = String::from_utf8_lossy(&raw).into_owned();
        raw.clear();
        let record = match format.parse(&line) {
            Ok(record) => record,
            Err(ParseError::Empty) => continue,
            Err(ParseError::NotData) => {
                info!("device: {}", line.trim());
                continue;
            }
            Err(e) => {
                debug!("skipping {:?}: {}", line.trim(), e);
                continue;
            }
        };

        let row = CaptureRow::new(started.elapsed().as_millis() as u64, &record, gated);
        if row.sentinel {
            sentinels += 1;
        }
        writer.serialize(&row)?;
        writer.flush()?;
        written += 1;
    }

    if sentinels > 0 {
        info!("{} of {} records were sentinels", sentinels, written);
    }
    Ok(written)
}

fn list_ports() {
    println!("Available serial ports:");
    match serialport::available_ports() {
        Ok(ports) => {
            if ports.is_empty() {
                println!("  (none)");
            }
            for port in ports {
                print!("  {}", port.port_name);
                match &port.port_type {
                    serialport::SerialPortType::UsbPort(info) => {
                        println!(" - USB (VID: 0x{:04x}, PID: 0x{:04x})", info.vid, info.pid);
                        if let Some(ref product) = info.product {
                            println!("      Product: {}", product);
                        }
                    }
                    serialport::SerialPortType::BluetoothPort => println!(" - Bluetooth"),
                    serialport::SerialPortType::PciPort => println!(" - PCI"),
                    serialport::SerialPortType::Unknown => println!(" - Unknown"),
                }
            }
        }
        Err(e) => {
            eprintln!("Error listing ports: {}", e);
        }
    }
}

/// Prefer a Raspberry Pi board, else the first USB serial adapter
fn find_device_port() -> Option<String> {
    let ports = serialport::available_ports().ok()?;
    let usb: Vec<_> = ports
        .into_iter()
        .filter_map(|port| match &port.port_type {
            serialport::SerialPortType::UsbPort(info) => Some((info.vid, port.port_name)),
            _ => None,
        })
        .collect();

    usb.iter()
        .find(|(vid, _)| *vid == RASPBERRY_PI_VID)
        .or_else(|| usb.first())
        .map(|(_, name)| name.clone())
}
