use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use uart_capture_core::processing::wav_format::WAV_HEADER_SIZE;
use uart_capture_core::{
    parse_wav_header, ByteSource, CaptureConfiguration, CaptureController, CaptureHandle, FinalStatus,
    RecordingMetadata, StreamSource,
};
use uart_capture_serial::{list_ports as enumerate_ports, open_serial, PortInfo, PortKind};

use crate::args::{Cli, SourceChoice};
use crate::exit::{capture_error, serial_error, status_code, CliError, CliResult, SUCCESS};
use crate::presenter::{print_summary, Presenter};

pub fn capture(cli: &Cli) -> CliResult<i32> {
    let choice = cli
        .source()
        .ok_or_else(|| CliError::usage("one of --port, --tcp or --replay is required"))?;

    let config = build_config(cli, &choice);
    let sample_rate = config.sample_rate;
    let target_samples = config.target_samples();
    let mut controller =
        CaptureController::new(config).map_err(|err| capture_error("invalid configuration", err))?;

    let mut source = open_source(&choice, cli)?;

    let presenter = Arc::new(Presenter::new(target_samples, cli.quiet || cli.json));
    controller.set_delegate(presenter);
    install_ctrlc_handler(controller.handle());

    let result = controller.run(source.as_mut());
    if let Err(e) = source.close() {
        log::warn!("failed to close {}: {}", source.describe(), e);
    }
    let status = result.map_err(|err| capture_error("capture failed to start", err))?;

    verify_file(&status);
    if cli.json {
        let meta = RecordingMetadata::from_status(&status, sample_rate);
        print_json(&meta)?;
    } else if !cli.quiet {
        print_summary(&status);
    }

    Ok(status_code(&status.status, choice.closes_at_end()))
}

pub fn list_ports(cli: &Cli) -> CliResult<i32> {
    let ports = enumerate_ports().map_err(|err| serial_error("port enumeration failed", err))?;

    if cli.json {
        let entries: Vec<PortEntry> = ports.iter().map(PortEntry::from).collect();
        print_json(&entries)?;
    } else if ports.is_empty() {
        eprintln!("no serial ports found");
    } else {
        for port in &ports {
            println!("{port}");
        }
    }
    Ok(SUCCESS)
}

fn build_config(cli: &Cli, choice: &SourceChoice) -> CaptureConfiguration {
    CaptureConfiguration {
        sample_rate: cli.sample_rate,
        target_duration_secs: cli.target_duration(),
        output_path: cli.outfile.clone(),
        sync_timeout: cli.sync_timeout,
        read_timeout: cli.read_timeout,
        write_metadata: cli.metadata,
        baud_rate: match choice {
            SourceChoice::Serial { baud, .. } => Some(*baud),
            _ => None,
        },
    }
}

fn open_source(choice: &SourceChoice, cli: &Cli) -> CliResult<Box<dyn ByteSource>> {
    let source: Box<dyn ByteSource> = match choice {
        SourceChoice::Serial { port, baud } => Box::new(
            open_serial(port, *baud, cli.read_timeout).map_err(|err| serial_error("cannot open serial port", err))?,
        ),
        SourceChoice::Tcp(addr) => {
            Box::new(StreamSource::connect_tcp(addr).map_err(|err| capture_error("cannot connect", err))?)
        }
        SourceChoice::Replay(path) => {
            Box::new(StreamSource::open_replay(path).map_err(|err| capture_error("cannot open replay", err))?)
        }
    };
    Ok(source)
}

/// Ctrl-C stops the capture after the current frame; the file is finalized
/// as usual.
fn install_ctrlc_handler(handle: CaptureHandle) {
    let result = ctrlc::set_handler(move || {
        if !handle.is_cancelled() {
            log::info!("interrupt received, finishing capture");
        }
        handle.cancel();
    });
    if let Err(err) = result {
        log::warn!("signal handler setup failed, Ctrl-C will not stop cleanly: {err}");
    }
}

/// Re-read the written header and warn if it disagrees with the summary.
fn verify_file(status: &FinalStatus) {
    match read_header(&status.file_path) {
        Ok(header) if u64::from(header.data_size) == status.samples_written * 2 => {
            log::debug!(
                "{}: {} Hz, {} frames, {:.2} s",
                status.file_path.display(),
                header.sample_rate,
                header.frame_count(),
                header.duration_secs()
            );
        }
        Ok(header) => log::warn!(
            "{}: header reports {} data bytes, expected {}",
            status.file_path.display(),
            header.data_size,
            status.samples_written * 2
        ),
        Err(e) => log::warn!("could not verify {}: {}", status.file_path.display(), e),
    }
}

fn read_header(path: &Path) -> Result<uart_capture_core::WavHeader, String> {
    let mut buf = [0u8; WAV_HEADER_SIZE];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut buf))
        .map_err(|e| e.to_string())?;
    parse_wav_header(&buf).map_err(|e| e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(crate::exit::INTERNAL, format!("json encoding failed: {err}")))?;
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct PortEntry {
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<String>,
}

impl From<&PortInfo> for PortEntry {
    fn from(port: &PortInfo) -> Self {
        let (kind, vid, pid, product) = match &port.kind {
            PortKind::Usb { vid, pid, product, .. } => ("usb", Some(*vid), Some(*pid), product.clone()),
            PortKind::Pci => ("pci", None, None, None),
            PortKind::Bluetooth => ("bluetooth", None, None, None),
            PortKind::Unknown => ("unknown", None, None, None),
        };
        Self {
            name: port.name.clone(),
            kind,
            vid,
            pid,
            product,
        }
    }
}
