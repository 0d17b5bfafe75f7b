//! CLI argument definitions using Clap

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// uart-capture - record framed 16-bit PCM from a UART into a WAV file
#[derive(Parser, Debug)]
#[command(name = "uart-capture")]
#[command(version)]
#[command(about = "Record framed 16-bit PCM from a UART, TCP socket or replay file into a WAV file")]
#[command(long_about = None)]
pub struct Cli {
    /// Serial port to read from (e.g. /dev/ttyUSB0, COM3)
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<String>,

    /// Read from a TCP endpoint instead of a serial port
    #[arg(long, value_name = "HOST:PORT", conflicts_with_all = ["port", "replay"])]
    pub tcp: Option<String>,

    /// Replay a raw byte dump captured from the link
    #[arg(long, value_name = "FILE", conflicts_with_all = ["port", "tcp"])]
    pub replay: Option<PathBuf>,

    /// Serial line rate
    #[arg(short = 'b', long, value_name = "BAUD", default_value_t = 921_600)]
    pub baud: u32,

    /// Capture length in seconds (0 or less records until stopped)
    #[arg(short = 's', long, value_name = "SECS", default_value_t = 10.0, allow_negative_numbers = true)]
    pub seconds: f64,

    /// Sample rate written to the WAV header
    #[arg(long = "fs", value_name = "HZ", default_value_t = 16_000)]
    pub sample_rate: u32,

    /// Output WAV file
    #[arg(short = 'o', long, value_name = "FILE", default_value = "capture.wav")]
    pub outfile: PathBuf,

    /// Give up on one sync attempt after this many seconds and retry
    #[arg(long, value_name = "SECS", default_value = "5", value_parser = parse_secs)]
    pub sync_timeout: Duration,

    /// Bound on each individual read from the source
    #[arg(long, value_name = "SECS", default_value = "1", value_parser = parse_secs)]
    pub read_timeout: Duration,

    /// Write <outfile>.metadata.json next to the recording
    #[arg(long)]
    pub metadata: bool,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Minimum log level (stderr); RUST_LOG is used when omitted
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// No progress display or summary
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Where the bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChoice {
    Serial { port: String, baud: u32 },
    Tcp(String),
    Replay(PathBuf),
}

impl SourceChoice {
    /// Whether running out of data is the expected way for this source to end.
    pub fn closes_at_end(&self) -> bool {
        matches!(self, SourceChoice::Replay(_))
    }
}

impl Cli {
    pub fn source(&self) -> Option<SourceChoice> {
        if let Some(path) = &self.replay {
            return Some(SourceChoice::Replay(path.clone()));
        }
        if let Some(addr) = &self.tcp {
            return Some(SourceChoice::Tcp(addr.clone()));
        }
        self.port.as_ref().map(|port| SourceChoice::Serial {
            port: port.clone(),
            baud: self.baud,
        })
    }

    /// `None` when the capture should run until stopped.
    pub fn target_duration(&self) -> Option<f64> {
        (self.seconds > 0.0).then_some(self.seconds)
    }
}

fn parse_secs(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|_| format!("not a number: {value}"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("must be a positive number of seconds: {value}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{e}: {value}"))
}
