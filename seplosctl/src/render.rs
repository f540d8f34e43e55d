//! Human readable reports of a [SeplosData] snapshot

use std::fmt::{self, Display};

use seplos_protocol::alarm::{ByteAlarm, TEMPERATURE_NAMES};
use seplos_protocol::data::{N_CELLS, SeplosData, fahrenheit};

/// Cells per row of the cell table
const CELLS_PER_ROW: usize = 8;

fn voltage_alarm(alarm: ByteAlarm) -> &'static str {
    match alarm {
        ByteAlarm::Normal => "normal",
        ByteAlarm::LowLimit => "depleted, the voltage is below the lower limit",
        ByteAlarm::HighLimit => "overcharged, the voltage is above the upper limit",
        ByteAlarm::Other(ByteAlarm::OTHER_ALARM) => "the controller reports an \"other\" alarm",
        ByteAlarm::Other(_) => "undocumented alarm state",
    }
}

fn current_alarm(alarm: ByteAlarm) -> &'static str {
    match alarm {
        ByteAlarm::Normal => "normal",
        ByteAlarm::LowLimit => "the discharge current exceeds the limit of the battery",
        ByteAlarm::HighLimit => "the charge current exceeds the limit of the battery",
        ByteAlarm::Other(ByteAlarm::OTHER_ALARM) => "the controller reports an \"other\" alarm",
        ByteAlarm::Other(_) => "undocumented alarm state",
    }
}

fn temperature_alarm(alarm: ByteAlarm) -> &'static str {
    match alarm {
        ByteAlarm::Normal => "normal",
        ByteAlarm::LowLimit => "too cold, below the lower limit",
        ByteAlarm::HighLimit => "too hot, above the upper limit",
        ByteAlarm::Other(ByteAlarm::OTHER_ALARM) => "the controller reports an \"other\" alarm",
        ByteAlarm::Other(_) => "undocumented alarm state",
    }
}

/// Banner lines for the aggregate alarm flags
fn alarm_banner(data: &SeplosData) -> impl Iterator<Item = &'static str> {
    let alarms = data.alarms;
    [
        (alarms.depleted, "THE BATTERY IS DEPLETED"),
        (alarms.overcharge, "THE BATTERY IS OVERCHARGED"),
        (alarms.hot, "THE BATTERY IS TOO HOT"),
        (alarms.cold, "THE BATTERY IS TOO COLD"),
        (
            alarms.other_or_undocumented_alarm_state,
            "The battery reports an \"other\" or undocumented alarm state",
        ),
    ]
    .into_iter()
    .filter_map(|(set, text)| set.then_some(text))
}

/// Byte alarms that are not normal, as (label, explanation)
fn byte_alarms(data: &SeplosData) -> Vec<(String, &'static str)> {
    let mut alarms = Vec::new();
    let voltage = ByteAlarm::from(data.total_battery_voltage_alarm);
    if voltage.is_alarm() {
        alarms.push(("Total battery voltage".to_string(), voltage_alarm(voltage)));
    }
    let current = ByteAlarm::from(data.charge_discharge_current_alarm);
    if current.is_alarm() {
        alarms.push(("Charge/discharge current".to_string(), current_alarm(current)));
    }
    for (cell, code) in data.cell_alarm.iter().enumerate() {
        let alarm = ByteAlarm::from(*code);
        if alarm.is_alarm() {
            alarms.push((format!("Cell {}", cell + 1), voltage_alarm(alarm)));
        }
    }
    for (name, code) in TEMPERATURE_NAMES.iter().zip(data.temperature_alarm) {
        let alarm = ByteAlarm::from(code);
        if alarm.is_alarm() {
            alarms.push((name.to_string(), temperature_alarm(alarm)));
        }
    }
    alarms
}

/// Names of the set bit alarms
fn bit_alarms(data: &SeplosData) -> Vec<String> {
    data.bit_alarms
        .active()
        .zip(data.bit_alarms.active_names())
        .map(|(i, name)| match name {
            Some(name) => name.to_string(),
            None => format!("Reserved alarm bit {i}"),
        })
        .collect()
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "off" }
}

/// Plain text report
pub struct Text<'a> {
    data: &'a SeplosData,
    longer: bool,
}

impl<'a> Text<'a> {
    /// `longer` adds the per cell table and every temperature sensor
    pub fn new(data: &'a SeplosData, longer: bool) -> Self {
        Self { data, longer }
    }

    fn cell_rows(&self, f: &mut fmt::Formatter<'_>, cells: std::ops::Range<usize>) -> fmt::Result {
        let m = self.data;
        write!(f, "Cell:         ")?;
        for cell in cells.clone() {
            write!(f, " {:>5}", cell + 1)?;
        }
        write!(f, "\nVoltage:      ")?;
        for cell in cells.clone() {
            write!(f, " {:.3}", m.cell_voltage[cell])?;
        }
        write!(f, "\nEqualizing:   ")?;
        for cell in cells.clone() {
            write!(f, " {:>5}", if m.is_equalizing(cell) { '*' } else { '-' })?;
        }
        write!(f, "\nDisconnected: ")?;
        for cell in cells {
            write!(f, " {:>5}", if m.is_disconnected(cell) { '*' } else { '-' })?;
        }
        writeln!(f)
    }
}

impl Display for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.data;
        writeln!(
            f,
            "Controller {:X}, battery pack {:X}:",
            m.controller_address, m.battery_pack_number
        )?;
        if m.alarms.has_alarm {
            writeln!(f, "!!! ALARM !!! The battery reports an alarm state.")?;
            writeln!(
                f,
                "Resolve the issue as soon as possible or the battery may be damaged."
            )?;
            for line in alarm_banner(m) {
                writeln!(f, "!!! {line} !!!")?;
            }
            let byte_alarms = byte_alarms(m);
            if !byte_alarms.is_empty() {
                writeln!(f)?;
                for (label, explanation) in byte_alarms {
                    writeln!(f, "{label}: {explanation}.")?;
                }
            }
            let bit_alarms = bit_alarms(m);
            if !bit_alarms.is_empty() {
                writeln!(f)?;
                for name in bit_alarms {
                    writeln!(f, "Alarm: {name}.")?;
                }
            }
        } else {
            writeln!(f, "No alarms.")?;
        }

        writeln!(f)?;
        writeln!(f, "Voltage:          {:.2} V", m.total_battery_voltage)?;
        writeln!(f, "Current:          {:.2} A", m.charge_discharge_current)?;
        writeln!(f, "State of charge:  {:.0}%", m.state_of_charge)?;
        writeln!(
            f,
            "Temperatures:     {:.0} - {:.0} C, {:.0} - {:.0} F (internal heating: {})",
            m.lowest_temperature,
            m.highest_temperature,
            fahrenheit(m.lowest_temperature),
            fahrenheit(m.highest_temperature),
            on_off(m.heating_switch)
        )?;
        writeln!(
            f,
            "Cell voltages:    {:.3} - {:.3} V (unbalance: {:.3} V)",
            m.lowest_cell_voltage,
            m.highest_cell_voltage,
            m.cell_voltage_unbalance()
        )?;
        writeln!(f, "Port voltage:     {:.2} V", m.port_voltage)?;
        writeln!(f, "Remaining:        {:.2} Ah", m.residual_capacity)?;
        writeln!(f, "Battery capacity: {:.2} Ah", m.battery_capacity)?;
        writeln!(f, "Rated capacity:   {:.2} Ah", m.rated_capacity)?;
        writeln!(f, "State of health:  {:.0}%", m.state_of_health)?;
        writeln!(f, "Cycles:           {}", m.number_of_cycles)?;

        if self.longer {
            writeln!(f, "\nBattery cell state:\n")?;
            for start in (0..N_CELLS).step_by(CELLS_PER_ROW) {
                self.cell_rows(f, start..start + CELLS_PER_ROW)?;
                writeln!(f)?;
            }
            for (name, celsius) in TEMPERATURE_NAMES.iter().zip(m.temperature) {
                writeln!(
                    f,
                    "{:<30} {celsius:.0} C, {:.0} F",
                    format!("{name}:"),
                    fahrenheit(celsius)
                )?;
            }
        }
        Ok(())
    }
}

/// HTML fragment with the same content as [Text]
pub struct Html<'a> {
    data: &'a SeplosData,
    longer: bool,
}

impl<'a> Html<'a> {
    pub fn new(data: &'a SeplosData, longer: bool) -> Self {
        Self { data, longer }
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_row(f: &mut fmt::Formatter<'_>, label: &str, value: impl Display) -> fmt::Result {
    writeln!(
        f,
        "<tr><th style=\"text-align: right;\">{label}</th><td>{value}</td></tr>"
    )
}

impl Display for Html<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.data;
        writeln!(
            f,
            "<h2>Controller {:X}, battery pack {:X}</h2>",
            m.controller_address, m.battery_pack_number
        )?;
        writeln!(f, "<p>")?;
        if m.alarms.has_alarm {
            writeln!(
                f,
                "<strong>&#x26a0;&nbsp;ALARM: the battery reports an alarm state.</strong><br/>"
            )?;
            writeln!(
                f,
                "Resolve the issue as soon as possible or the battery may be damaged.<br/>"
            )?;
            for line in alarm_banner(m) {
                writeln!(f, "<strong>{}</strong><br/>", html_escape(line))?;
            }
            for (label, explanation) in byte_alarms(m) {
                writeln!(
                    f,
                    "{}: {}.<br/>",
                    html_escape(&label),
                    html_escape(explanation)
                )?;
            }
            for name in bit_alarms(m) {
                writeln!(f, "<strong>Alarm: {}.</strong><br/>", html_escape(&name))?;
            }
        } else {
            writeln!(f, "&#x263a;&nbsp;No alarms.")?;
        }
        writeln!(f, "</p>")?;

        writeln!(f, "<table>")?;
        html_row(f, "Voltage", format_args!("{:.2} V", m.total_battery_voltage))?;
        html_row(f, "Current", format_args!("{:.2} A", m.charge_discharge_current))?;
        html_row(f, "State of Charge", format_args!("{:.0}%", m.state_of_charge))?;
        html_row(
            f,
            "Temperatures",
            format_args!(
                "{:.0} - {:.0} C, {:.0} - {:.0} F (internal heating: {})",
                m.lowest_temperature,
                m.highest_temperature,
                fahrenheit(m.lowest_temperature),
                fahrenheit(m.highest_temperature),
                on_off(m.heating_switch)
            ),
        )?;
        html_row(
            f,
            "Cell Voltages",
            format_args!(
                "{:.3} - {:.3} V (unbalance {:.3} V)",
                m.lowest_cell_voltage,
                m.highest_cell_voltage,
                m.cell_voltage_unbalance()
            ),
        )?;
        html_row(f, "Port Voltage", format_args!("{:.2} V", m.port_voltage))?;
        html_row(
            f,
            "Residual Capacity",
            format_args!("{:.2} Ah", m.residual_capacity),
        )?;
        html_row(
            f,
            "Battery Capacity",
            format_args!("{:.2} Ah", m.battery_capacity),
        )?;
        html_row(f, "Rated Capacity", format_args!("{:.2} Ah", m.rated_capacity))?;
        html_row(f, "State of Health", format_args!("{:.0}%", m.state_of_health))?;
        html_row(f, "Lifetime Cycles", m.number_of_cycles)?;
        writeln!(f, "</table>")?;

        if self.longer {
            writeln!(f, "<h3>Battery Cell State</h3>")?;
            writeln!(f, "<table>")?;
            writeln!(
                f,
                "<tr><th>Cell</th><th>Voltage</th><th>Equalizing</th><th>Disconnected</th></tr>"
            )?;
            for cell in 0..N_CELLS {
                writeln!(
                    f,
                    "<tr><td>{}</td><td>{:.3} V</td><td>{}</td><td>{}</td></tr>",
                    cell + 1,
                    m.cell_voltage[cell],
                    if m.is_equalizing(cell) { "*" } else { "-" },
                    if m.is_disconnected(cell) { "*" } else { "-" }
                )?;
            }
            writeln!(f, "</table>")?;
            writeln!(f, "<table>")?;
            for (name, celsius) in TEMPERATURE_NAMES.iter().zip(m.temperature) {
                html_row(
                    f,
                    name,
                    format_args!("{celsius:.0} C, {:.0} F", fahrenheit(celsius)),
                )?;
            }
            writeln!(f, "</table>")?;
        }
        Ok(())
    }
}
