//! Alarm codes, their names and the aggregate alarm state of a pack

use core::fmt::Display;

use log::debug;

use crate::commands::Telecommand;
use crate::data::{N_BIT_ALARMS, N_TEMPERATURES};

/// Value of a byte sized alarm field
///
/// Used for the cell, temperature, current and total voltage alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteAlarm {
    Normal,
    /// The lower limit was hit
    LowLimit,
    /// The upper limit was hit
    HighLimit,
    /// `0xF0` ("other alarm") or an undocumented code
    Other(u8),
}
impl ByteAlarm {
    /// Code the device sends for "other alarm"
    pub const OTHER_ALARM: u8 = 0xF0;

    pub fn is_alarm(&self) -> bool {
        *self != ByteAlarm::Normal
    }
}
impl From<u8> for ByteAlarm {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ByteAlarm::Normal,
            0x01 => ByteAlarm::LowLimit,
            0x02 => ByteAlarm::HighLimit,
            code => ByteAlarm::Other(code),
        }
    }
}
impl Display for ByteAlarm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ByteAlarm::Normal => write!(f, "normal"),
            ByteAlarm::LowLimit => write!(f, "lower limit hit"),
            ByteAlarm::HighLimit => write!(f, "upper limit hit"),
            ByteAlarm::Other(ByteAlarm::OTHER_ALARM) => write!(f, "other alarm"),
            ByteAlarm::Other(code) => write!(f, "undocumented alarm {code:#04X}"),
        }
    }
}

/// Names of the temperature sensors in the order they are reported
pub const TEMPERATURE_NAMES: [&str; N_TEMPERATURES] = [
    "Cell temperature 1",
    "Cell temperature 2",
    "Cell temperature 3",
    "Cell temperature 4",
    "Ambient temperature",
    "Power electronics temperature",
];

/// Names of the bit alarms, indexed by `8 * (event - 1) + bit`
///
/// Reserved bits have no name.
pub const BIT_ALARM_NAMES: [Option<&str>; N_BIT_ALARMS] = [
    // Alarm event 1
    Some("Voltage sensor fault"),
    Some("Temperature sensor fault"),
    Some("Current sensor fault"),
    Some("Key switch fault"),
    Some("Cell voltage difference fault"),
    Some("Charging switch fault"),
    Some("Discharge switch fault"),
    Some("Current limit switch fault"),
    // Alarm event 2
    Some("Cell high voltage alarm"),
    Some("Cell overvoltage protection"),
    Some("Cell low voltage alarm"),
    Some("Cell undervoltage protection"),
    Some("Total high voltage alarm"),
    Some("Total overvoltage protection"),
    Some("Total low voltage alarm"),
    Some("Total undervoltage protection"),
    // Alarm event 3
    Some("Charge high temperature alarm"),
    Some("Charge over temperature protection"),
    Some("Charge low temperature alarm"),
    Some("Charge under temperature protection"),
    Some("Discharge high temperature alarm"),
    Some("Discharge over temperature protection"),
    Some("Discharge low temperature alarm"),
    Some("Discharge under temperature protection"),
    // Alarm event 4
    Some("Ambient high temperature alarm"),
    Some("Ambient over temperature protection"),
    Some("Ambient low temperature alarm"),
    Some("Ambient under temperature protection"),
    Some("Power over temperature protection"),
    Some("Power high temperature alarm"),
    Some("Cell low temperature heating"),
    None,
    // Alarm event 5
    Some("Charge overcurrent alarm"),
    Some("Charge overcurrent protection"),
    Some("Discharge overcurrent alarm"),
    Some("Discharge overcurrent protection"),
    Some("Transient overcurrent protection"),
    Some("Output short circuit protection"),
    Some("Transient overcurrent lockout"),
    Some("Output short circuit lockout"),
    // Alarm event 6
    Some("Charge high voltage protection"),
    Some("Intermittent recharge waiting"),
    Some("Residual capacity alarm"),
    Some("Residual capacity protection"),
    Some("Cell low voltage charging prohibited"),
    Some("Output reverse polarity protection"),
    Some("Output connection fault"),
    None,
    // Alarm event 7
    None,
    None,
    None,
    None,
    Some("Automatic charging waiting"),
    Some("Manual charging waiting"),
    None,
    None,
    // Alarm event 8
    Some("EEPROM storage fault"),
    Some("RTC clock fault"),
    Some("Voltage calibration not performed"),
    Some("Current calibration not performed"),
    Some("Zero point calibration not performed"),
    None,
    None,
    None,
];

/// The 64 bit alarms
///
/// Alarm event 1 is the least significant byte, event 8 the most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BitAlarms(pub u64);
impl BitAlarms {
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    pub fn is_set(&self, index: usize) -> bool {
        index < N_BIT_ALARMS && self.0 & (1 << index) != 0
    }
    /// Indices of the set alarms in ascending order
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        (0..N_BIT_ALARMS).filter(move |i| self.is_set(*i))
    }
    /// Names of the set alarms, reserved bits show up as `None`
    pub fn active_names(&self) -> impl Iterator<Item = Option<&'static str>> + '_ {
        self.active().map(|i| BIT_ALARM_NAMES[i])
    }
}

/// Aggregate view of every alarm a pack reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AlarmSummary {
    /// Set if any of the other flags is set
    pub has_alarm: bool,
    /// A byte alarm is `0xF0` or holds an undocumented code
    pub other_or_undocumented_alarm_state: bool,
    pub has_cell_alarm: bool,
    pub has_temperature_alarm: bool,
    /// Total voltage or charge/discharge current alarm, cell alarms are not included
    pub has_voltage_or_current_alarm: bool,
    pub has_bit_alarm: bool,
    /// A cell or the total voltage is below the lower limit
    pub depleted: bool,
    /// A cell or the total voltage is above the upper limit
    pub overcharge: bool,
    pub cold: bool,
    pub hot: bool,
}

impl AlarmSummary {
    /// Classify the alarms of a decoded telecommand record
    ///
    /// Only the first alarming cell is classified, the codes of every cell
    /// stay available in [Telecommand::cell_alarm].
    pub fn classify(telecommand: &Telecommand) -> Self {
        let mut summary = AlarmSummary::default();

        let voltage = ByteAlarm::from(telecommand.total_battery_voltage_alarm);
        if voltage.is_alarm() {
            summary.has_voltage_or_current_alarm = true;
            match voltage {
                ByteAlarm::LowLimit => summary.depleted = true,
                ByteAlarm::HighLimit => summary.overcharge = true,
                _ => summary.other_or_undocumented_alarm_state = true,
            }
        }

        // Too high a current is no statement about the state of charge
        let current = ByteAlarm::from(telecommand.charge_discharge_current_alarm);
        if current.is_alarm() {
            summary.has_voltage_or_current_alarm = true;
            if let ByteAlarm::Other(_) = current {
                summary.other_or_undocumented_alarm_state = true;
            }
        }

        if let Some((cell, alarm)) = telecommand
            .cell_alarm
            .iter()
            .map(|code| ByteAlarm::from(*code))
            .enumerate()
            .find(|(_, alarm)| alarm.is_alarm())
        {
            debug!("Cell {cell}: {alarm}");
            summary.has_cell_alarm = true;
            match alarm {
                ByteAlarm::LowLimit => summary.depleted = true,
                ByteAlarm::HighLimit => summary.overcharge = true,
                _ => summary.other_or_undocumented_alarm_state = true,
            }
        }

        for (name, code) in TEMPERATURE_NAMES.iter().zip(telecommand.temperature_alarm) {
            let alarm = ByteAlarm::from(code);
            if !alarm.is_alarm() {
                continue;
            }
            debug!("{name}: {alarm}");
            summary.has_temperature_alarm = true;
            match alarm {
                ByteAlarm::LowLimit => summary.cold = true,
                ByteAlarm::HighLimit => summary.hot = true,
                _ => summary.other_or_undocumented_alarm_state = true,
            }
        }

        summary.has_bit_alarm = !telecommand.bit_alarms.is_empty();

        summary.has_alarm = summary.has_cell_alarm
            || summary.has_temperature_alarm
            || summary.has_voltage_or_current_alarm
            || summary.has_bit_alarm
            || summary.other_or_undocumented_alarm_state
            || summary.depleted
            || summary.overcharge
            || summary.cold
            || summary.hot;
        summary
    }
}
