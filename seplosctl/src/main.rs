use std::{fmt::Display, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::warn;
use seplos_protocol::{Channel, SeplosBms, commands::CurrentEncoding};
use simple_logger::SimpleLogger;

mod render;
mod serial;

use serial::SerialChannel;

/// A Command Line tool to monitor batteries with a Seplos BMS speaking protocol 2.0
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Serial device to use
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    device: PathBuf,

    /// Controller address on the bus
    #[arg(short, long, default_value_t = 0)]
    address: u8,

    /// Battery pack number
    #[arg(short, long, default_value_t = 1)]
    pack: u8,

    /// Baud rate
    #[arg(short, long, default_value_t = 19200)]
    baud: u32,

    /// Timeout in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout: u64,

    /// How often a failed exchange is repeated
    #[arg(short, long, default_value_t = 2)]
    retries: u8,

    /// Sign encoding of the charge/discharge current
    #[arg(long, value_enum, default_value_t = CurrentEncodingArg::SignMagnitude)]
    current_encoding: CurrentEncodingArg,

    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the state of a battery pack
    Monitor {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Add the per cell state and every temperature sensor
        #[arg(short, long)]
        longer: bool,
    },
    /// Query the protocol version of the BMS
    ProtocolVersion,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Html,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum CurrentEncodingArg {
    /// Bit 15 is the sign
    SignMagnitude,
    TwosComplement,
}

impl From<CurrentEncodingArg> for CurrentEncoding {
    fn from(value: CurrentEncodingArg) -> Self {
        match value {
            CurrentEncodingArg::SignMagnitude => CurrentEncoding::SignMagnitude,
            CurrentEncodingArg::TwosComplement => CurrentEncoding::TwosComplement,
        }
    }
}

/// Run `request` until it succeeds, at most `retries + 1` times
///
/// The BMS discards pending input before every request, so a late answer
/// to a failed attempt does not leak into the next one.
fn with_retries<T, E: Display>(
    retries: u8,
    mut request: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let mut attempt = 0;
    loop {
        match request() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!("Attempt {attempt} of {} failed: {e}", retries as u16 + 1);
            }
            Err(e) => return Err(e),
        }
    }
}

fn monitor<C: Channel>(
    bms: &mut SeplosBms<C>,
    args: &Args,
    format: Format,
    longer: bool,
) -> Result<()>
where
    C::Error: 'static + Send + Sync,
{
    let data = with_retries(args.retries, || {
        bms.get_monitor_snapshot(args.address, args.pack)
    })
    .with_context(|| {
        format!(
            "Cannot get the state of pack {} at address {}",
            args.pack, args.address
        )
    })?;
    match format {
        Format::Text => print!("{}", render::Text::new(&data, longer)),
        Format::Html => print!("{}", render::Html::new(&data, longer)),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&data).context("Cannot serialize snapshot")?
        ),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(args.verbose.log_level_filter())
        .init()
        .context("Cannot init logging")?;

    let channel = SerialChannel::open(
        &args.device,
        args.baud,
        Duration::from_millis(args.timeout),
    )
    .with_context(|| format!("Cannot open serial port '{}'", args.device.display()))?;

    let mut bms = SeplosBms::with_current_encoding(channel, args.current_encoding.into());

    match args.command {
        Commands::Monitor { format, longer } => monitor(&mut bms, &args, format, longer)?,
        Commands::ProtocolVersion => {
            let version = with_retries(args.retries, || bms.get_protocol_version(args.address))
                .context("Cannot get protocol version")?;
            println!("{:.1}", version.as_f32());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_until_success() {
        let mut calls = 0;
        let result: Result<u8, &str> = with_retries(2, || {
            calls += 1;
            if calls < 3 { Err("timeout") } else { Ok(7) }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 3);
    }
    #[test]
    fn test_retries_are_bounded() {
        let mut calls = 0;
        let result: Result<u8, &str> = with_retries(2, || {
            calls += 1;
            Err("timeout")
        });
        assert_eq!(result, Err("timeout"));
        assert_eq!(calls, 3);
    }
    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["seplosctl", "monitor"]).unwrap();
        assert_eq!(args.device, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(args.address, 0);
        assert_eq!(args.pack, 1);
        assert_eq!(args.baud, 19200);
        assert_eq!(args.timeout, 1000);
        assert_eq!(args.retries, 2);
        assert!(matches!(
            args.command,
            Commands::Monitor {
                format: Format::Text,
                longer: false
            }
        ));
    }
    #[test]
    fn test_protocol_version_args() {
        let args = Args::try_parse_from([
            "seplosctl",
            "-d",
            "/dev/ttyS1",
            "-a",
            "2",
            "--current-encoding",
            "twos-complement",
            "protocol-version",
        ])
        .unwrap();
        assert_eq!(args.address, 2);
        assert!(matches!(args.command, Commands::ProtocolVersion));
        assert_eq!(
            CurrentEncoding::from(args.current_encoding),
            CurrentEncoding::TwosComplement
        );
    }
}
