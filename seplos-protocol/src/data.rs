//! The decoded state of one battery pack

use crate::alarm::{AlarmSummary, BitAlarms};
use crate::commands::{Telecommand, Telemetry};

/// Cell voltages and cell alarms carried by every record
pub const N_CELLS: usize = 16;
/// Temperature readings and temperature alarms carried by every record
pub const N_TEMPERATURES: usize = 6;
/// Bit alarms of alarm events 1 to 8
pub const N_BIT_ALARMS: usize = 64;

/// Convert degrees Celsius to degrees Fahrenheit
pub fn fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Everything the BMS reports about a pack, in engineering units
///
/// Byte alarms are kept as raw codes, see [crate::alarm::ByteAlarm].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeplosData {
    pub controller_address: u8,
    pub battery_pack_number: u8,

    pub alarms: AlarmSummary,

    /// Degrees Celsius, over the reported sensors
    pub lowest_temperature: f32,
    /// Degrees Celsius, over the reported sensors
    pub highest_temperature: f32,
    /// Volt, over the reported cells
    pub lowest_cell_voltage: f32,
    /// Volt, over the reported cells
    pub highest_cell_voltage: f32,

    pub number_of_cells: u8,
    pub number_of_temperatures: u8,
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
    /// Percent, ratio of the current maximum charge to the rated capacity
    pub state_of_health: f32,
    /// Volt
    pub port_voltage: f32,

    pub discharge: bool,
    pub charge: bool,
    pub floating_charge: bool,
    pub standby: bool,
    pub shutdown: bool,

    pub discharge_switch: bool,
    pub charge_switch: bool,
    pub current_limit_switch: bool,
    pub heating_switch: bool,

    /// Volt
    pub cell_voltage: [f32; N_CELLS],
    /// Degrees Celsius
    pub temperature: [f32; N_TEMPERATURES],
    /// Bit `n` is set while cell `n` is being equalized
    pub equilibrium_state: u16,
    /// Bit `n` is set while cell `n` is disconnected
    pub disconnection_state: u16,

    pub cell_alarm: [u8; N_CELLS],
    pub temperature_alarm: [u8; N_TEMPERATURES],
    pub charge_discharge_current_alarm: u8,
    pub total_battery_voltage_alarm: u8,
    pub bit_alarms: BitAlarms,
}

/// Lowest and highest value, both `0.0` for no values
fn range(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), v| {
            (low.min(*v), high.max(*v))
        })
}

impl SeplosData {
    /// Merge the two records of a pack and classify its alarms
    pub fn new(
        controller_address: u8,
        battery_pack_number: u8,
        telemetry: &Telemetry,
        telecommand: &Telecommand,
    ) -> Self {
        let (lowest_cell_voltage, highest_cell_voltage) = range(telemetry.reported_cells());
        let (lowest_temperature, highest_temperature) = range(telemetry.reported_temperatures());
        let switches = telecommand.on_off_state;
        let state = telecommand.system_state;

        SeplosData {
            controller_address,
            battery_pack_number,
            alarms: AlarmSummary::classify(telecommand),
            lowest_temperature,
            highest_temperature,
            lowest_cell_voltage,
            highest_cell_voltage,
            number_of_cells: telemetry.number_of_cells,
            number_of_temperatures: telemetry.number_of_temperatures,
            charge_discharge_current: telemetry.charge_discharge_current,
            total_battery_voltage: telemetry.total_battery_voltage,
            residual_capacity: telemetry.residual_capacity,
            battery_capacity: telemetry.battery_capacity,
            state_of_charge: telemetry.state_of_charge,
            rated_capacity: telemetry.rated_capacity,
            number_of_cycles: telemetry.number_of_cycles,
            state_of_health: telemetry.state_of_health,
            port_voltage: telemetry.port_voltage,
            discharge: state.discharge(),
            charge: state.charge(),
            floating_charge: state.floating_charge(),
            standby: state.standby(),
            shutdown: state.shutdown(),
            discharge_switch: switches.discharge_switch(),
            charge_switch: switches.charge_switch(),
            current_limit_switch: switches.current_limit_switch(),
            heating_switch: switches.heating_switch(),
            cell_voltage: telemetry.cell_voltage,
            temperature: telemetry.temperature,
            equilibrium_state: telecommand.equilibrium_state,
            disconnection_state: telecommand.disconnection_state,
            cell_alarm: telecommand.cell_alarm,
            temperature_alarm: telecommand.temperature_alarm,
            charge_discharge_current_alarm: telecommand.charge_discharge_current_alarm,
            total_battery_voltage_alarm: telecommand.total_battery_voltage_alarm,
            bit_alarms: telecommand.bit_alarms,
        }
    }

    /// Difference between the highest and the lowest cell voltage
    pub fn cell_voltage_unbalance(&self) -> f32 {
        self.highest_cell_voltage - self.lowest_cell_voltage
    }

    pub fn is_equalizing(&self, cell: usize) -> bool {
        cell < N_CELLS && self.equilibrium_state & (1 << cell) != 0
    }

    pub fn is_disconnected(&self, cell: usize) -> bool {
        cell < N_CELLS && self.disconnection_state & (1 << cell) != 0
    }
}
