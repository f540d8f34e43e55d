use log::debug;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use super::RecordError;
use crate::data::{N_CELLS, N_TEMPERATURES};
use crate::hex::{Hex2, Hex4, HexDecoder};

/// Offset of the temperature readings, they are sent in 0.1K
const KELVIN_OFFSET: i32 = 2731;

/// Wire layout of the "_telemetry get_" (`0x42`) response payload
#[allow(dead_code)]
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawTelemetry {
    data_flag: Hex2,
    command_group: Hex2,
    number_of_cells: Hex2,
    cell_voltage: [Hex4; N_CELLS],
    number_of_temperatures: Hex2,
    temperature: [Hex4; N_TEMPERATURES],
    charge_discharge_current: Hex4,
    total_battery_voltage: Hex4,
    residual_capacity: Hex4,
    number_of_custom_fields: Hex2,
    battery_capacity: Hex4,
    state_of_charge: Hex4,
    rated_capacity: Hex4,
    number_of_cycles: Hex4,
    state_of_health: Hex4,
    port_voltage: Hex4,
    reserved: [Hex4; 4],
}

/// How the device encodes the sign of the charge/discharge current
///
/// Which one a given firmware uses is not settled, both are supported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CurrentEncoding {
    /// Bit 15 is the sign, bits 0..15 the magnitude. `0x8064` is -1.00A.
    #[default]
    SignMagnitude,
    /// Plain 16 bit two's complement. `0xFF9C` is -1.00A.
    TwosComplement,
}
impl CurrentEncoding {
    /// Convert a raw current reading to ampere, negative while discharging
    pub fn ampere(&self, raw: u16) -> f32 {
        let centiampere = match self {
            CurrentEncoding::SignMagnitude if raw & 0x8000 != 0 => -((raw & 0x7FFF) as i32),
            CurrentEncoding::SignMagnitude => raw as i32,
            CurrentEncoding::TwosComplement => raw as i16 as i32,
        };
        centiampere as f32 / 100.0
    }
}

/// Response payload of a "_telemetry get_" command in engineering units
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub number_of_cells: u8,
    /// Volt
    pub cell_voltage: [f32; N_CELLS],
    pub number_of_temperatures: u8,
    /// Degrees Celsius
    pub temperature: [f32; N_TEMPERATURES],
    /// Ampere, negative while discharging
    pub charge_discharge_current: f32,
    /// Volt
    pub total_battery_voltage: f32,
    /// Ampere-hours
    pub residual_capacity: f32,
    /// Ampere-hours
    pub battery_capacity: f32,
    /// Percent
    pub state_of_charge: f32,
    /// Ampere-hours
    pub rated_capacity: f32,
    pub number_of_cycles: u16,
    /// Percent of the rated capacity the battery can still hold
    pub state_of_health: f32,
    /// Volt
    pub port_voltage: f32,
}

impl Telemetry {
    /// Size of the ASCII payload
    pub const ENCODED_LEN: usize = size_of::<RawTelemetry>();

    /// Decode a validated ASCII payload
    pub fn from_ascii(info: &[u8], current: CurrentEncoding) -> Result<Self, RecordError> {
        let (raw, _) =
            RawTelemetry::read_from_prefix(info).map_err(|_| RecordError::Truncated {
                expected: Self::ENCODED_LEN,
                actual: info.len(),
            })?;
        let mut hex = HexDecoder::new();

        let cell_voltage = raw
            .cell_voltage
            .map(|v| v.decode(&mut hex) as f32 / 1000.0);
        let temperature = raw
            .temperature
            .map(|t| (t.decode(&mut hex) as i32 - KELVIN_OFFSET) as f32 / 10.0);
        let raw_current = raw.charge_discharge_current.decode(&mut hex);
        debug!("Raw current {raw_current:#06X}");

        let telemetry = Telemetry {
            number_of_cells: raw.number_of_cells.decode(&mut hex),
            cell_voltage,
            number_of_temperatures: raw.number_of_temperatures.decode(&mut hex),
            temperature,
            charge_discharge_current: current.ampere(raw_current),
            total_battery_voltage: raw.total_battery_voltage.decode(&mut hex) as f32 / 100.0,
            residual_capacity: raw.residual_capacity.decode(&mut hex) as f32 / 100.0,
            battery_capacity: raw.battery_capacity.decode(&mut hex) as f32 / 100.0,
            state_of_charge: raw.state_of_charge.decode(&mut hex) as f32 / 10.0,
            rated_capacity: raw.rated_capacity.decode(&mut hex) as f32 / 100.0,
            number_of_cycles: raw.number_of_cycles.decode(&mut hex),
            state_of_health: raw.state_of_health.decode(&mut hex) as f32 / 10.0,
            port_voltage: raw.port_voltage.decode(&mut hex) as f32 / 100.0,
        };
        if hex.is_invalid() {
            return Err(RecordError::InvalidHexCharacter);
        }
        Ok(telemetry)
    }

    /// Cell voltages of the cells the pack reports
    pub fn reported_cells(&self) -> &[f32] {
        &self.cell_voltage[..(self.number_of_cells as usize).min(N_CELLS)]
    }

    /// Temperatures of the sensors the pack reports
    pub fn reported_temperatures(&self) -> &[f32] {
        &self.temperature[..(self.number_of_temperatures as usize).min(N_TEMPERATURES)]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hex::u16_encode_hex;

    /// Build a telemetry payload from raw field values
    pub(crate) struct TelemetryBuilder {
        pub cells: [u16; N_CELLS],
        pub temperatures: [u16; N_TEMPERATURES],
        pub current: u16,
        pub total_voltage: u16,
        pub residual_capacity: u16,
        pub battery_capacity: u16,
        pub soc: u16,
        pub rated_capacity: u16,
        pub cycles: u16,
        pub soh: u16,
        pub port_voltage: u16,
    }
    impl Default for TelemetryBuilder {
        fn default() -> Self {
            Self {
                cells: [3300; N_CELLS],
                temperatures: [2981; N_TEMPERATURES],
                current: 0,
                total_voltage: 5280,
                residual_capacity: 16500,
                battery_capacity: 20000,
                soc: 825,
                rated_capacity: 20000,
                cycles: 42,
                soh: 1000,
                port_voltage: 5279,
            }
        }
    }
    impl TelemetryBuilder {
        pub(crate) fn build(&self) -> Vec<u8> {
            let mut info = Vec::new();
            info.extend_from_slice(b"0001");
            info.extend_from_slice(b"10");
            for cell in self.cells {
                info.extend_from_slice(&u16_encode_hex(cell));
            }
            info.extend_from_slice(b"06");
            for temperature in self.temperatures {
                info.extend_from_slice(&u16_encode_hex(temperature));
            }
            for value in [self.current, self.total_voltage, self.residual_capacity] {
                info.extend_from_slice(&u16_encode_hex(value));
            }
            info.extend_from_slice(b"0A");
            for value in [
                self.battery_capacity,
                self.soc,
                self.rated_capacity,
                self.cycles,
                self.soh,
                self.port_voltage,
                0,
                0,
                0,
                0,
            ] {
                info.extend_from_slice(&u16_encode_hex(value));
            }
            info
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_layout_size() {
        assert_eq!(Telemetry::ENCODED_LEN, 150);
        assert_eq!(TelemetryBuilder::default().build().len(), 150);
    }
    #[test]
    fn test_decode_units() {
        let mut builder = TelemetryBuilder::default();
        builder.cells[0] = 3271;
        builder.cells[15] = 3405;
        builder.temperatures[4] = 2731;
        builder.temperatures[5] = 2631;
        let telemetry =
            Telemetry::from_ascii(&builder.build(), CurrentEncoding::default()).unwrap();

        assert_eq!(telemetry.number_of_cells, 16);
        assert_eq!(telemetry.number_of_temperatures, 6);
        assert!(close(telemetry.cell_voltage[0], 3.271));
        assert!(close(telemetry.cell_voltage[1], 3.3));
        assert!(close(telemetry.cell_voltage[15], 3.405));
        assert!(close(telemetry.temperature[0], 25.0));
        assert!(close(telemetry.temperature[4], 0.0));
        assert!(close(telemetry.temperature[5], -10.0));
        assert!(close(telemetry.charge_discharge_current, 0.0));
        assert!(close(telemetry.total_battery_voltage, 52.8));
        assert!(close(telemetry.residual_capacity, 165.0));
        assert!(close(telemetry.battery_capacity, 200.0));
        assert!(close(telemetry.state_of_charge, 82.5));
        assert!(close(telemetry.rated_capacity, 200.0));
        assert_eq!(telemetry.number_of_cycles, 42);
        assert!(close(telemetry.state_of_health, 100.0));
        assert!(close(telemetry.port_voltage, 52.79));
    }
    #[test]
    fn test_sign_magnitude_current() {
        let encoding = CurrentEncoding::SignMagnitude;
        assert!(close(encoding.ampere(0x8064), -1.0));
        assert!(close(encoding.ampere(0x0064), 1.0));
        assert!(close(encoding.ampere(0x8000), 0.0));
    }
    #[test]
    fn test_twos_complement_current() {
        let encoding = CurrentEncoding::TwosComplement;
        assert!(close(encoding.ampere(0xFF9C), -1.0));
        assert!(close(encoding.ampere(0x0064), 1.0));
        assert!(close(encoding.ampere(0x8000), -327.68));
    }
    #[test]
    fn test_decode_negative_current() {
        let builder = TelemetryBuilder {
            current: 0x8064,
            ..Default::default()
        };
        let telemetry =
            Telemetry::from_ascii(&builder.build(), CurrentEncoding::SignMagnitude).unwrap();
        assert!(close(telemetry.charge_discharge_current, -1.0));
    }
    #[test]
    fn test_truncated_payload() {
        let info = TelemetryBuilder::default().build();
        let result = Telemetry::from_ascii(&info[..100], CurrentEncoding::default());
        assert_eq!(
            result,
            Err(RecordError::Truncated {
                expected: 150,
                actual: 100
            })
        );
    }
    #[test]
    fn test_reported_cells() {
        let mut info = TelemetryBuilder::default().build();
        // 15 cells and 4 sensors
        info[4..6].copy_from_slice(b"0F");
        info[70..72].copy_from_slice(b"04");
        let telemetry = Telemetry::from_ascii(&info, CurrentEncoding::default()).unwrap();
        assert_eq!(telemetry.reported_cells().len(), 15);
        assert_eq!(telemetry.reported_temperatures().len(), 4);
    }
}
