#![cfg_attr(not(test), no_std)]
use core::fmt::Display;

use embedded_io::Read;
use embedded_io::Write;
use log::{debug, warn};

pub mod alarm;
pub mod checksum;
pub mod commands;
pub mod data;
mod frame;
pub mod hex;

pub use frame::{
    Cid2, CommandCode, Frame, InfoLength, MAX_ENCODED_PAYLOAD_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN,
    PayloadTooLarge, ResponseCode, Version,
};

use crate::commands::{CurrentEncoding, Telecommand, Telemetry};
use crate::data::SeplosData;

/// Major version this library intends to implement
const PROTOCOL_VERSION_MAJOR: u8 = 2;
/// Minor version this library intends to implement
const PROTOCOL_VERSION_MINOR: u8 = 0;

/// Half-duplex byte channel to the BMS
///
/// Reads block until the requested bytes arrived or the transport gives up,
/// [Write::flush] blocks until everything written left the wire.
pub trait Channel: Read + Write {
    /// Throw away whatever was received but not read yet
    fn discard_pending_input(&mut self) -> Result<(), Self::Error>;
}

impl<T: Channel + ?Sized> Channel for &mut T {
    fn discard_pending_input(&mut self) -> Result<(), Self::Error> {
        T::discard_pending_input(self)
    }
}

/// Seplos protocol 2.0 BMS
pub struct SeplosBms<C: Channel> {
    channel: C,
    current_encoding: CurrentEncoding,
}

impl<C: Channel> SeplosBms<C> {
    pub fn new(channel: C) -> Self {
        Self::with_current_encoding(channel, CurrentEncoding::default())
    }

    /// Use `current_encoding` to decode the charge/discharge current
    pub fn with_current_encoding(channel: C, current_encoding: CurrentEncoding) -> Self {
        SeplosBms {
            channel,
            current_encoding,
        }
    }

    /// Send one command and receive the validated response
    ///
    /// Pending input is discarded first so a late answer to an earlier
    /// request can not be taken for the response.
    /// A response code other than [ResponseCode::Normal] is left to the caller.
    pub fn command<'b>(
        &mut self,
        address: u8,
        command: CommandCode,
        info: &[u8],
        buf: &'b mut [u8; MAX_FRAME_LEN],
    ) -> Result<Frame<'b>, Error<C::Error>> {
        let request = Frame::new(Version::default(), address, command, info)?;

        self.channel.discard_pending_input().map_err(Error::Read)?;
        request.encode(&mut self.channel)?;
        self.channel.flush().map_err(Error::Write)?;
        debug!("Sent {command:?} to {address:#04X}");

        let response = Frame::decode(&mut self.channel, buf)?;
        if response.adr != address {
            warn!(
                "Response from {:#04X} to a request for {address:#04X}",
                response.adr
            );
        }
        Ok(response)
    }

    /// Get the protocol version the BMS speaks
    ///
    /// The BMS answers with an empty payload, the version is the one of the
    /// response frame.
    pub fn get_protocol_version(&mut self, address: u8) -> Result<Version, Error<C::Error>> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        // Only the address is evaluated, the pack number is a placeholder
        let response = self.command(address, CommandCode::ProtocolVersionGet, b"00", &mut buf)?;
        Self::expect_normal(&response)?;
        Ok(response.ver)
    }

    /// Get a complete snapshot of a battery pack
    ///
    /// Sends "_telemetry get_" and "_telecommand get_" for `pack` and merges
    /// both answers. Nothing is returned unless both exchanges succeeded.
    pub fn get_monitor_snapshot(
        &mut self,
        address: u8,
        pack: u8,
    ) -> Result<SeplosData, Error<C::Error>> {
        let info = hex::u8_encode_hex(pack);
        let mut buf = [0u8; MAX_FRAME_LEN];

        let response = self.command(address, CommandCode::TelemetryGet, &info, &mut buf)?;
        Self::expect_normal(&response)?;
        let telemetry = Telemetry::from_ascii(response.info, self.current_encoding)?;

        let response = self.command(address, CommandCode::TelecommandGet, &info, &mut buf)?;
        Self::expect_normal(&response)?;
        let telecommand = Telecommand::from_ascii(response.info)?;

        Ok(SeplosData::new(address, pack, &telemetry, &telecommand))
    }

    fn expect_normal(response: &Frame<'_>) -> Result<(), Error<C::Error>> {
        match response.response_code() {
            Some(code) if !code.is_ok() => Err(Error::Response(code)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum Error<T: embedded_io::Error> {
    /// Error signaled by BMS
    Response(ResponseCode),
    /// Transport error while sending
    Write(T),
    /// Transport error while receiving
    Read(T),
    /// The channel ended before a complete frame was received
    UnexpectedEof,
    /// A frame field holds something other than hex digits
    InvalidHexCharacter,
    /// The response is of a major version this library does not speak
    UnsupportedProtocolVersion(Version),
    /// Bad `LCHKSUM` in a received frame
    LengthChecksum,
    /// Bad `CHKSUM` in a received frame
    Checksum,
    /// Request payload of this many characters does not fit a frame
    PayloadTooLarge(usize),
    /// Valid frame with a payload too short for the expected record
    TruncatedRecord { expected: usize, actual: usize },
}

impl<T: embedded_io::Error> Display for Error<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Response(response_code) => write!(f, "BMS responded with {response_code}"),
            Error::Write(e) => write!(f, "Transport error while sending: {e}"),
            Error::Read(e) => write!(f, "Transport error while receiving: {e}"),
            Error::UnexpectedEof => write!(f, "Incomplete frame received"),
            Error::InvalidHexCharacter => write!(f, "Invalid hex character"),
            Error::UnsupportedProtocolVersion(ver) => {
                write!(f, "Unsupported protocol version {ver}")
            }
            Error::LengthChecksum => write!(f, "Length checksum error"),
            Error::Checksum => write!(f, "Checksum error"),
            Error::PayloadTooLarge(len) => write!(
                f,
                "Payload of {len} characters exceeds {MAX_ENCODED_PAYLOAD_LEN}"
            ),
            Error::TruncatedRecord { expected, actual } => write!(
                f,
                "Record of {actual} characters is shorter than {expected}"
            ),
        }
    }
}
impl<T: embedded_io::Error + 'static> core::error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Write(e) | Error::Read(e) => Some(e),
            _ => None,
        }
    }
}
impl<T: embedded_io::Error> From<embedded_io::ReadExactError<T>> for Error<T> {
    fn from(value: embedded_io::ReadExactError<T>) -> Self {
        match value {
            embedded_io::ReadExactError::UnexpectedEof => Error::UnexpectedEof,
            embedded_io::ReadExactError::Other(e) => Error::Read(e),
        }
    }
}
impl<T: embedded_io::Error> From<PayloadTooLarge> for Error<T> {
    fn from(value: PayloadTooLarge) -> Self {
        Error::PayloadTooLarge(value.0)
    }
}

/// Install the logger once for the whole test binary
#[cfg(test)]
fn init_logger() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        simple_logger::init_with_level(log::Level::Debug).unwrap();
    });
}
