use core::fmt::Display;

use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use super::RecordError;
use crate::alarm::BitAlarms;
use crate::data::{N_CELLS, N_TEMPERATURES};
use crate::hex::{Hex2, HexDecoder};

/// Wire layout of the "_telecommand get_" (`0x44`) response payload
#[allow(dead_code)]
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawTelecommand {
    data_flag: Hex2,
    command_group: Hex2,
    number_of_cells: Hex2,
    cell_alarm: [Hex2; N_CELLS],
    number_of_temperatures: Hex2,
    temperature_alarm: [Hex2; N_TEMPERATURES],
    charge_discharge_current_alarm: Hex2,
    total_battery_voltage_alarm: Hex2,
    number_of_custom_alarms: Hex2,
    alarm_event: [Hex2; 6],
    on_off_state: Hex2,
    equilibrium_state: [Hex2; 2],
    system_state: Hex2,
    disconnection_state: [Hex2; 2],
    alarm_event_7_8: [Hex2; 2],
    reserved: [Hex2; 6],
}

/// State of the switches of a pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OnOffState(pub u8);
impl OnOffState {
    pub fn discharge_switch(&self) -> bool {
        self.0 & 0b0000_0001 != 0
    }
    pub fn charge_switch(&self) -> bool {
        self.0 & 0b0000_0010 != 0
    }
    pub fn current_limit_switch(&self) -> bool {
        self.0 & 0b0000_0100 != 0
    }
    pub fn heating_switch(&self) -> bool {
        self.0 & 0b0000_1000 != 0
    }
}
impl Display for OnOffState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "discharge switch: {}, charge switch: {}, current limit switch: {}, heating switch: {}",
            self.discharge_switch(),
            self.charge_switch(),
            self.current_limit_switch(),
            self.heating_switch()
        )
    }
}

/// What the pack is currently doing
///
/// Bit 3 is not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemState(pub u8);
impl SystemState {
    pub fn discharge(&self) -> bool {
        self.0 & 0b0000_0001 != 0
    }
    pub fn charge(&self) -> bool {
        self.0 & 0b0000_0010 != 0
    }
    pub fn floating_charge(&self) -> bool {
        self.0 & 0b0000_0100 != 0
    }
    pub fn standby(&self) -> bool {
        self.0 & 0b0001_0000 != 0
    }
    pub fn shutdown(&self) -> bool {
        self.0 & 0b0010_0000 != 0
    }
}

/// Response payload of a "_telecommand get_" command
///
/// Byte alarms are kept as the raw codes the device sent,
/// see [crate::alarm::ByteAlarm] for their meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telecommand {
    pub cell_alarm: [u8; N_CELLS],
    pub temperature_alarm: [u8; N_TEMPERATURES],
    pub charge_discharge_current_alarm: u8,
    pub total_battery_voltage_alarm: u8,
    pub bit_alarms: BitAlarms,
    pub on_off_state: OnOffState,
    /// One bit per cell, set while the cell is being equalized
    pub equilibrium_state: u16,
    pub system_state: SystemState,
    /// One bit per cell, set while the cell is disconnected
    pub disconnection_state: u16,
}

impl Telecommand {
    /// Size of the ASCII payload
    pub const ENCODED_LEN: usize = size_of::<RawTelecommand>();

    /// Decode a validated ASCII payload
    pub fn from_ascii(info: &[u8]) -> Result<Self, RecordError> {
        let (raw, _) =
            RawTelecommand::read_from_prefix(info).map_err(|_| RecordError::Truncated {
                expected: Self::ENCODED_LEN,
                actual: info.len(),
            })?;
        let mut hex = HexDecoder::new();

        // Alarm events 1 to 8 fill the alarm bits from the least significant byte up
        let mut events = [0u8; 8];
        for (event, field) in events
            .iter_mut()
            .zip(raw.alarm_event.iter().chain(raw.alarm_event_7_8.iter()))
        {
            *event = field.decode(&mut hex);
        }

        let telecommand = Telecommand {
            cell_alarm: raw.cell_alarm.map(|a| a.decode(&mut hex)),
            temperature_alarm: raw.temperature_alarm.map(|a| a.decode(&mut hex)),
            charge_discharge_current_alarm: raw.charge_discharge_current_alarm.decode(&mut hex),
            total_battery_voltage_alarm: raw.total_battery_voltage_alarm.decode(&mut hex),
            bit_alarms: BitAlarms(u64::from_le_bytes(events)),
            on_off_state: OnOffState(raw.on_off_state.decode(&mut hex)),
            equilibrium_state: u16::from_le_bytes(raw.equilibrium_state.map(|b| b.decode(&mut hex))),
            system_state: SystemState(raw.system_state.decode(&mut hex)),
            disconnection_state: u16::from_le_bytes(
                raw.disconnection_state.map(|b| b.decode(&mut hex)),
            ),
        };
        if hex.is_invalid() {
            return Err(RecordError::InvalidHexCharacter);
        }
        Ok(telecommand)
    }
}
