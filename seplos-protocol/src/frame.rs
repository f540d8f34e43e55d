use embedded_io::{Read, Write};

use crate::Error;
use crate::checksum::{self, Checksum};
use crate::hex::{self, Hex2, Hex4, HexDecoder};
use core::fmt::Display;
use log::{debug, trace, warn};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// The maximum size of the ASCII encoded payload in bytes
pub const MAX_ENCODED_PAYLOAD_LEN: usize = 4095;
/// Size of a frame with an empty payload
///
/// `SOI`, twelve header characters, four checksum characters and `EOI`.
pub const MIN_FRAME_LEN: usize = 18;
/// Size of the largest possible frame
pub const MAX_FRAME_LEN: usize = MIN_FRAME_LEN + MAX_ENCODED_PAYLOAD_LEN;
/// `SOI` and the header fields in front of the payload
const HEADER_LEN: usize = 13;
/// ASCII characters of the `CHKSUM` field
const CHECKSUM_LEN: usize = 4;

/// A protocol frame
#[derive(Debug)]
pub struct Frame<'a> {
    /// Protocol version field
    pub ver: Version,
    /// Controller address on the bus
    pub adr: u8,
    /// `CID1`
    ///
    /// Device type, always [Frame::BATTERY] for frames we send.
    pub cid1: u8,
    /// `CID2`
    ///
    /// Either a command or a response code.
    pub cid2: Cid2,
    /// `LENGTH`
    ///
    /// Encodes the length of the `INFO` field.
    pub length: InfoLength,
    /// `INFO` as ASCII hex characters
    ///
    /// The payload of the frame.
    /// Either command data (`COMMAND_INFO`) or
    /// response data (`DATA_INFO`).
    pub info: &'a [u8],
}

/// The fixed size part of a received frame
#[derive(FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawHeader {
    soi: u8,
    ver: Hex2,
    adr: Hex2,
    cid1: Hex2,
    cid2: Hex2,
    length: Hex4,
}

impl<'a> Frame<'a> {
    /// The Start of Information flag (`~`)
    pub const SOI: u8 = 0x7E;
    /// The End of Information flag (Carriage Return (CR) `\r`)
    pub const EOI: u8 = 0x0D;
    /// `CID1` of a battery
    pub const BATTERY: u8 = 0x46;

    /// Construct a new frame
    ///
    /// `info` is copied to the wire verbatim and therefore has to be ASCII
    /// hex already, e.g. `b"01"` for pack number one.
    /// Returns [PayloadTooLarge] for more than [MAX_ENCODED_PAYLOAD_LEN] characters.
    pub fn new(
        ver: Version,
        adr: u8,
        cid2: impl Into<Cid2>,
        info: &'a [u8],
    ) -> Result<Frame<'a>, PayloadTooLarge> {
        if info.len() > MAX_ENCODED_PAYLOAD_LEN {
            return Err(PayloadTooLarge(info.len()));
        }
        Ok(Self {
            ver,
            adr,
            cid1: Self::BATTERY,
            cid2: cid2.into(),
            length: InfoLength::new(info.len() as u16),
            info,
        })
    }

    /// Receive and validate a ASCII encoded frame
    ///
    /// Reads the fixed [MIN_FRAME_LEN] bytes first and then as much payload
    /// as the `LENGTH` field announces. The returned frame borrows its payload
    /// from `buf`.
    ///
    /// A response code other than [ResponseCode::Normal] is not an error here,
    /// it is returned in [Frame::cid2] for the caller to act on.
    pub fn decode<R: Read>(
        reader: &mut R,
        buf: &'a mut [u8; MAX_FRAME_LEN],
    ) -> Result<Frame<'a>, Error<R::Error>> {
        reader.read_exact(&mut buf[..MIN_FRAME_LEN])?;
        trace!("Received header {:02X?}", &buf[..MIN_FRAME_LEN]);

        let (header, _) = RawHeader::read_from_prefix(&buf[..]).map_err(|_| Error::UnexpectedEof)?;

        // The whole header is decoded before the first check so that
        // a broken frame is reported in full.
        let mut hex = HexDecoder::new();
        if header.soi != Self::SOI {
            warn!("Expected SOI {:#04X}, got {:#04X}", Self::SOI, header.soi);
            hex.invalidate();
        }

        let mut ver_hex = HexDecoder::new();
        let ver = Version(header.ver.decode(&mut ver_hex));
        if ver_hex.is_invalid() {
            hex.invalidate();
        }
        debug!("Decoded ver {ver}");

        let adr = header.adr.decode(&mut hex);
        debug!("Decoded adr {adr:#04X}");

        let cid1 = header.cid1.decode(&mut hex);
        if cid1 != Self::BATTERY {
            warn!("Unexpected device type {cid1:#04X}");
        }

        let cid2 = ResponseCode::from(header.cid2.decode(&mut hex));
        debug!("Decoded response code: {cid2:?}");

        let length = InfoLength(header.length.decode(&mut hex));

        // Any minor version is accepted
        if !ver_hex.is_invalid() && ver.major() != crate::PROTOCOL_VERSION_MAJOR {
            warn!("Protocol {ver} not implemented");
            return Err(Error::UnsupportedProtocolVersion(ver));
        }
        if hex.is_invalid() {
            warn!(
                "Non hex character in header {:?}",
                core::str::from_utf8(&buf[..HEADER_LEN])
            );
            return Err(Error::InvalidHexCharacter);
        }
        if !length.is_valid() {
            warn!("Length checksum mismatch in {:#06X}", length.0);
            return Err(Error::LengthChecksum);
        }
        let info_len = length.length() as usize;
        debug!("Decoded valid payload length: {info_len}");

        if info_len > 0 {
            reader.read_exact(&mut buf[MIN_FRAME_LEN..MIN_FRAME_LEN + info_len])?;
            trace!(
                "Received remaining {info_len} bytes {:02X?}",
                &buf[MIN_FRAME_LEN..MIN_FRAME_LEN + info_len]
            );
        }

        let info_end = HEADER_LEN + info_len;
        if !buf[HEADER_LEN..info_end + CHECKSUM_LEN]
            .iter()
            .all(|c| hex::is_hex_digit(*c))
        {
            warn!("Non hex character in payload or checksum");
            return Err(Error::InvalidHexCharacter);
        }

        let mut chksum = [0u8; CHECKSUM_LEN];
        chksum.copy_from_slice(&buf[info_end..info_end + CHECKSUM_LEN]);
        let chksum = hex.u16(&chksum);
        let calculated_checksum = checksum::overall_checksum(&buf[1..info_end]);
        debug!("Decoded checksum {chksum:#06X}, calculated checksum {calculated_checksum:#06X}");
        if chksum != calculated_checksum {
            warn!("Checksum mismatch");
            return Err(Error::Checksum);
        }

        let eoi = buf[info_end + CHECKSUM_LEN];
        if eoi != Self::EOI {
            warn!("Expected EOI {:#04X}, got {eoi:#04X}", Self::EOI);
        }

        if !cid2.is_ok() {
            warn!("Device answered with {cid2}");
        }
        debug!("Validated frame with {info_len} payload characters");
        Ok(Frame {
            ver,
            adr,
            cid1,
            cid2: cid2.into(),
            length,
            info: &buf[HEADER_LEN..info_end],
        })
    }

    /// Write the fully assembled ASCII/HEX encoded frame to `out`
    pub fn encode<W: Write>(&self, out: &mut W) -> Result<(), Error<W::Error>> {
        let mut chksum = Checksum::new();

        // write SOI
        out.write_all(&[Self::SOI]).map_err(Error::Write)?;

        let header = [
            self.ver.encode_hex(),
            hex::u8_encode_hex(self.adr),
            hex::u8_encode_hex(self.cid1),
            hex::u8_encode_hex(self.cid2.code()),
        ];
        for field in &header {
            chksum.update(field);
            out.write_all(field).map_err(Error::Write)?;
        }

        // encode LENGTH
        let len = self.length.encode_hex();
        chksum.update(&len);
        out.write_all(&len).map_err(Error::Write)?;

        // write data
        chksum.update(self.info);
        out.write_all(self.info).map_err(Error::Write)?;

        // write checksum
        let chksum = chksum.finalize();
        out.write_all(&hex::u16_encode_hex(chksum))
            .map_err(Error::Write)?;

        // write EOI
        out.write_all(&[Self::EOI]).map_err(Error::Write)?;

        Ok(())
    }

    /// The response code of a received frame
    ///
    /// `None` for a frame carrying a command.
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self.cid2 {
            Cid2::Response(code) => Some(code),
            Cid2::Command(_) => None,
        }
    }
}

/// A payload exceeded [MAX_ENCODED_PAYLOAD_LEN]
#[derive(Debug, PartialEq, Eq)]
pub struct PayloadTooLarge(pub usize);

/// Encoded protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(u8);
impl Version {
    /// Create a new [Version] from `major` and `minor`
    ///
    /// _Note:_ `major` and `minor` are only stored in 4bit.
    /// Values greater than `15` will be truncated.
    pub fn new(major: u8, minor: u8) -> Self {
        Self((major << 4) | (minor & 0b1111))
    }
    pub fn major(&self) -> u8 {
        self.0 >> 4
    }
    pub fn minor(&self) -> u8 {
        self.0 & 0b1111
    }
    /// The version as a decimal number, `2.3` for `0x23`
    pub fn as_f32(&self) -> f32 {
        self.major() as f32 + self.minor() as f32 / 10.0
    }
    pub fn encode_hex(&self) -> [u8; 2] {
        hex::u8_encode_hex(self.0)
    }
}
impl Default for Version {
    fn default() -> Self {
        Self::new(
            crate::PROTOCOL_VERSION_MAJOR,
            crate::PROTOCOL_VERSION_MINOR,
        )
    }
}
impl Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "v{}.{}", self.major(), self.minor())
    }
}

/// `CID2` control identifier
///
/// Eiter a command code or a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cid2 {
    Command(CommandCode),
    Response(ResponseCode),
}
impl Cid2 {
    pub fn code(&self) -> u8 {
        match self {
            Cid2::Command(cmd) => *cmd as u8,
            Cid2::Response(response) => response.code(),
        }
    }
}
impl From<CommandCode> for Cid2 {
    fn from(value: CommandCode) -> Self {
        Self::Command(value)
    }
}
impl From<ResponseCode> for Cid2 {
    fn from(value: ResponseCode) -> Self {
        Self::Response(value)
    }
}

/// `CID2` command codes
///
/// Only the "get" commands are implemented by [crate::SeplosBms],
/// the remaining codes are listed for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    /// Acquisition of telemetering information
    TelemetryGet = 0x42,
    /// Acquisition of telecommand information
    TelecommandGet = 0x44,
    /// Telecontrol command
    Telecontrol = 0x45,
    /// Acquisition of teleregulation information
    TeleregulationGet = 0x47,
    /// Setting of teleregulation information
    TeleregulationSet = 0x49,
    /// Acquisition of historical data
    HistoryGet = 0x4B,
    /// Acquisition time
    TimeGet = 0x4D,
    /// Synchronization time
    TimeSet = 0x4E,
    /// Acquisition of the communication protocol version number
    ProtocolVersionGet = 0x4F,
    /// Acquisition of device vendor information
    VendorGet = 0x51,
    /// Production calibration
    ProductionCalibration = 0xA0,
    /// Production setting
    ProductionSet = 0xA1,
    /// Regular recording
    RegularRecording = 0xA2,
}

/// `CID2` response codes
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResponseCode {
    /// Success
    Normal,
    /// Protocol version error
    VersionError,
    /// Frame checksum error
    ChecksumError,
    /// Length field checksum error
    LengthChecksumError,
    /// `CID2` invalid
    Cid2Error,
    /// Command format is invalid
    CommandFormatError,
    /// Info (payload) data invalid
    InvalidData,
    /// No historical data
    NoHistory,
    /// `CID1` invalid
    Cid1Error,
    /// Command execution failure
    ExecutionFailure,
    /// Device fault
    DeviceFault,
    /// Permission error
    PermissionError,
    /// Undocumented response code
    Other(u8),
}
impl ResponseCode {
    pub fn is_ok(&self) -> bool {
        *self == ResponseCode::Normal
    }
    pub fn code(&self) -> u8 {
        match self {
            ResponseCode::Normal => 0x00,
            ResponseCode::VersionError => 0x01,
            ResponseCode::ChecksumError => 0x02,
            ResponseCode::LengthChecksumError => 0x03,
            ResponseCode::Cid2Error => 0x04,
            ResponseCode::CommandFormatError => 0x05,
            ResponseCode::InvalidData => 0x06,
            ResponseCode::NoHistory => 0x07,
            ResponseCode::Cid1Error => 0xE1,
            ResponseCode::ExecutionFailure => 0xE2,
            ResponseCode::DeviceFault => 0xE3,
            ResponseCode::PermissionError => 0xE4,
            ResponseCode::Other(code) => *code,
        }
    }
}
impl From<u8> for ResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ResponseCode::Normal,
            0x01 => ResponseCode::VersionError,
            0x02 => ResponseCode::ChecksumError,
            0x03 => ResponseCode::LengthChecksumError,
            0x04 => ResponseCode::Cid2Error,
            0x05 => ResponseCode::CommandFormatError,
            0x06 => ResponseCode::InvalidData,
            0x07 => ResponseCode::NoHistory,
            0xE1 => ResponseCode::Cid1Error,
            0xE2 => ResponseCode::ExecutionFailure,
            0xE3 => ResponseCode::DeviceFault,
            0xE4 => ResponseCode::PermissionError,
            other => ResponseCode::Other(other),
        }
    }
}
impl Display for ResponseCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            ResponseCode::Normal => "normal",
            ResponseCode::VersionError => "protocol version error",
            ResponseCode::ChecksumError => "checksum error",
            ResponseCode::LengthChecksumError => "length checksum error",
            ResponseCode::Cid2Error => "command field error",
            ResponseCode::CommandFormatError => "command format error",
            ResponseCode::InvalidData => "data invalid",
            ResponseCode::NoHistory => "no historical data",
            ResponseCode::Cid1Error => "device type field error",
            ResponseCode::ExecutionFailure => "command execution failure",
            ResponseCode::DeviceFault => "device fault",
            ResponseCode::PermissionError => "permission error",
            ResponseCode::Other(code) => return write!(f, "undocumented response {code:#04X}"),
        };
        write!(f, "{text} ({:#04X})", self.code())
    }
}

/// Encoded length of the `INFO` field
///
/// The encoded value holds the length of the ASCII payload (`LENID`)
/// and a checksum over it (`LCHKSUM`).
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct InfoLength(u16);

impl InfoLength {
    /// Encode a new `INFO` length of `length` ASCII characters
    fn new(length: u16) -> Self {
        debug_assert!(length <= checksum::LENGTH_MASK);
        Self(checksum::length_field(length))
    }
    fn encode_hex(&self) -> [u8; 4] {
        hex::u16_encode_hex(self.0)
    }
    fn is_valid(&self) -> bool {
        checksum::length_field_is_valid(self.0)
    }
    /// Length of the payload in ASCII characters
    pub fn length(&self) -> u16 {
        self.0 & checksum::LENGTH_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_logger;

    /// Encode a frame into a fresh buffer
    fn encoded(frame: &Frame<'_>) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        frame.encode(&mut buf).expect("Error encoding frame");
        buf
    }

    /// A frame as sent by the device, built with our own encoder
    fn response(code: ResponseCode, info: &[u8]) -> Vec<u8> {
        encoded(&Frame::new(Version::new(2, 0), 0, code, info).unwrap())
    }

    #[test]
    fn test_info_length() {
        const EXPECTED: u16 = 0b1101_0000_0001_0010;
        let length = InfoLength::new(18);
        assert_eq!(length.0, EXPECTED);
        assert_eq!(length.length(), 18);
    }
    #[test]
    fn test_version_encoding() {
        let ver = Version::new(2, 0);
        assert_eq!(ver.major(), 2);
        assert_eq!(ver.minor(), 0);
        assert_eq!(format!("{ver}"), "v2.0");
        assert_eq!(&ver.encode_hex(), b"20");
        assert_eq!(Version::default(), ver);
    }
    #[test]
    fn test_version_as_decimal() {
        assert!((Version::new(2, 3).as_f32() - 2.3).abs() < f32::EPSILON);
    }
    #[test]
    fn test_response_code_table() {
        assert_eq!(ResponseCode::from(0x00), ResponseCode::Normal);
        assert_eq!(ResponseCode::from(0x07), ResponseCode::NoHistory);
        assert_eq!(ResponseCode::from(0xE4), ResponseCode::PermissionError);
        assert_eq!(ResponseCode::from(0x90), ResponseCode::Other(0x90));
        for code in 0..=u8::MAX {
            assert_eq!(ResponseCode::from(code).code(), code);
        }
    }
    #[test]
    fn test_encode_get_version() {
        const EXPECTED: &[u8; 20] = b"~2000464FE00200FD23\r";
        let packet = Frame::new(
            Version::default(),
            0,
            CommandCode::ProtocolVersionGet,
            b"00",
        )
        .unwrap();
        let buf = encoded(&packet);
        assert_eq!(
            buf,
            EXPECTED,
            "Expected {:?} got {:?}",
            str::from_utf8(EXPECTED),
            str::from_utf8(&buf)
        );
    }
    #[test]
    fn test_encode_telemetry_get() {
        const EXPECTED: &[u8; 20] = &[
            0x7E, // SOI
            0x32, 0x30, // v2.0
            0x30, 0x31, // adr 01
            0x34, 0x36, // CID1
            0x34, 0x32, // CID2 (TelemetryGet)
            0x45, 0x30, 0x30, 0x32, // LENGTH (2)
            0x30, 0x31, // INFO
            0x46, 0x44, 0x33, 0x35, // CHKSUM
            0x0D, // EOI
        ];
        let packet = Frame::new(Version::new(2, 0), 1, CommandCode::TelemetryGet, b"01").unwrap();
        let buf = encoded(&packet);
        assert_eq!(
            buf,
            EXPECTED,
            "Expected {:?} got {:?}",
            str::from_utf8(EXPECTED),
            str::from_utf8(&buf)
        );
    }
    #[test]
    fn test_payload_too_large() {
        let info = [b'0'; MAX_ENCODED_PAYLOAD_LEN + 1];
        let err = Frame::new(Version::default(), 0, CommandCode::TelemetryGet, &info).unwrap_err();
        assert_eq!(err, PayloadTooLarge(4096));

        let info = [b'0'; MAX_ENCODED_PAYLOAD_LEN];
        let frame = Frame::new(Version::default(), 0, CommandCode::TelemetryGet, &info).unwrap();
        assert_eq!(frame.length.length(), 4095);
    }
    #[test]
    fn test_decode_empty_payload() {
        init_logger();
        // Answer to "get protocol version" from a device speaking v2.3
        let packet = encoded(&Frame::new(Version::new(2, 3), 0, ResponseCode::Normal, &[]).unwrap());
        assert_eq!(packet.len(), MIN_FRAME_LEN);

        let mut buf = [0u8; MAX_FRAME_LEN];
        let frame = Frame::decode(&mut packet.as_slice(), &mut buf).expect("Error decoding packet");
        assert_eq!(frame.ver, Version::new(2, 3));
        assert_eq!(frame.adr, 0);
        assert_eq!(frame.cid1, Frame::BATTERY);
        assert_eq!(frame.response_code(), Some(ResponseCode::Normal));
        assert!(frame.info.is_empty());
    }
    #[test]
    fn test_decode_round_trip_with_payload() {
        init_logger();
        let info = b"00011000FFAB0d05";
        let packet = response(ResponseCode::Normal, info);

        let mut buf = [0u8; MAX_FRAME_LEN];
        let frame = Frame::decode(&mut packet.as_slice(), &mut buf).expect("Error decoding packet");
        assert_eq!(frame.info, info);
        assert_eq!(frame.length.length() as usize, info.len());
    }
    #[test]
    fn test_decode_lower_case_checksum() {
        let mut packet = response(ResponseCode::Normal, b"01");
        let checksum = MIN_FRAME_LEN + 2 - 5;
        packet[checksum..checksum + 4].make_ascii_lowercase();

        let mut buf = [0u8; MAX_FRAME_LEN];
        assert!(Frame::decode(&mut packet.as_slice(), &mut buf).is_ok());
    }
    #[test]
    fn test_decode_zero_checksum() {
        // Header and payload sum to exactly 0x10000
        let mut info = vec![b'F'; 897];
        info.extend_from_slice(&[b'0'; 44]);
        let packet = response(ResponseCode::Normal, &info);
        assert_eq!(&packet[packet.len() - 5..], b"0000\r");

        let mut buf = [0u8; MAX_FRAME_LEN];
        let frame = Frame::decode(&mut packet.as_slice(), &mut buf).expect("Error decoding packet");
        assert_eq!(frame.info.len(), 941);
    }
    #[test]
    fn test_decode_reads_only_its_own_frame() {
        let mut stream = response(ResponseCode::Normal, b"0102");
        stream.extend_from_slice(b"~garbage");
        let mut reader = stream.as_slice();

        let mut buf = [0u8; MAX_FRAME_LEN];
        Frame::decode(&mut reader, &mut buf).expect("Error decoding packet");
        assert_eq!(reader, b"~garbage");
    }
    #[test]
    fn test_decode_non_normal_status() {
        let packet = response(ResponseCode::PermissionError, &[]);
        let mut buf = [0u8; MAX_FRAME_LEN];
        let frame = Frame::decode(&mut packet.as_slice(), &mut buf).expect("Error decoding packet");
        assert_eq!(frame.response_code(), Some(ResponseCode::PermissionError));
    }
    #[test]
    fn test_tampered_byte_is_detected() {
        init_logger();
        let packet = response(ResponseCode::Normal, b"0123456789ABCDEF");
        let checksummed = 1..packet.len() - 5;
        assert_eq!(checksummed.end, HEADER_LEN + 16);
        for i in checksummed {
            let mut tampered = packet.clone();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let mut buf = [0u8; MAX_FRAME_LEN];
            let result = Frame::decode(&mut tampered.as_slice(), &mut buf);
            match i {
                // "20" -> "00" is an unknown major version
                1 => assert!(
                    matches!(result, Err(Error::UnsupportedProtocolVersion(_))),
                    "byte {i}: {result:?}"
                ),
                // any change of the length trips LCHKSUM first
                9..=12 => assert!(
                    matches!(result, Err(Error::LengthChecksum)),
                    "byte {i}: {result:?}"
                ),
                // minor version, address, device type, response code and payload
                _ => assert!(matches!(result, Err(Error::Checksum)), "byte {i}: {result:?}"),
            }
        }
    }
    #[test]
    fn test_minor_version_is_checksummed() {
        let mut packet = response(ResponseCode::Normal, b"01");
        // v2.0 -> v2.1 is a supported version, only CHKSUM can notice
        packet[2] = b'1';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::Checksum)), "{result:?}");
    }
    #[test]
    fn test_checksum_excludes_soi() {
        // Replacing SOI must not turn into a checksum error
        let mut packet = response(ResponseCode::Normal, &[]);
        packet[0] = b'#';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::InvalidHexCharacter)), "{result:?}");
    }
    #[test]
    fn test_corrupted_length_checksum() {
        let mut packet = response(ResponseCode::Normal, b"01");
        // E002 -> D002
        packet[9] = b'D';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::LengthChecksum)), "{result:?}");
    }
    #[test]
    fn test_non_hex_in_header() {
        let mut packet = response(ResponseCode::Normal, &[]);
        packet[4] = b'x';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::InvalidHexCharacter)), "{result:?}");
    }
    #[test]
    fn test_non_hex_in_version() {
        let mut packet = response(ResponseCode::Normal, &[]);
        packet[1] = b'?';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::InvalidHexCharacter)), "{result:?}");
    }
    #[test]
    fn test_non_hex_in_payload() {
        let mut packet = response(ResponseCode::Normal, b"0102");
        packet[HEADER_LEN + 2] = b'g';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::InvalidHexCharacter)), "{result:?}");
    }
    #[test]
    fn test_non_hex_in_checksum() {
        let mut packet = response(ResponseCode::Normal, &[]);
        packet[HEADER_LEN + 1] = b'Z';
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(matches!(result, Err(Error::InvalidHexCharacter)), "{result:?}");
    }
    #[test]
    fn test_unsupported_major_version() {
        // Checksums are valid, only the version is wrong
        let packet = encoded(&Frame::new(Version::new(3, 1), 0, ResponseCode::Normal, &[]).unwrap());
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut packet.as_slice(), &mut buf);
        assert!(
            matches!(result, Err(Error::UnsupportedProtocolVersion(v)) if v == Version::new(3, 1)),
            "{result:?}"
        );
    }
    #[test]
    fn test_short_header() {
        let packet = response(ResponseCode::Normal, &[]);
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut &packet[..10], &mut buf);
        assert!(matches!(result, Err(Error::UnexpectedEof)), "{result:?}");
    }
    #[test]
    fn test_short_payload() {
        let packet = response(ResponseCode::Normal, b"0102030405060708");
        let mut buf = [0u8; MAX_FRAME_LEN];
        let result = Frame::decode(&mut &packet[..MIN_FRAME_LEN + 4], &mut buf);
        assert!(matches!(result, Err(Error::UnexpectedEof)), "{result:?}");
    }
}
