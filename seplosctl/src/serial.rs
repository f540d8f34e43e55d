use std::{io, path::Path, time::Duration};

use embedded_io::{ErrorType, Read, Write};
use embedded_io_adapters::std::FromStd;
use log::{debug, trace};
use seplos_protocol::Channel;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

/// RS-485 adapter the BMS is connected to
pub struct SerialChannel(FromStd<Box<dyn SerialPort>>);

impl SerialChannel {
    /// Open `device` with 8N1 framing
    ///
    /// Every read gives up after `timeout`, so an unplugged or sleeping BMS
    /// ends in an error instead of blocking forever.
    pub fn open(device: &Path, baud: u32, timeout: Duration) -> serialport::Result<Self> {
        let port = serialport::new(device.to_string_lossy(), baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;
        debug!(
            "Opened {} at {baud} baud, timeout {timeout:?}",
            device.display()
        );
        Ok(Self(FromStd::new(port)))
    }
}

impl ErrorType for SerialChannel {
    type Error = io::Error;
}
impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0.read(buf)
    }
}
impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf)
    }
    /// Blocks until the driver transmitted everything
    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}
impl Channel for SerialChannel {
    fn discard_pending_input(&mut self) -> Result<(), Self::Error> {
        let port = self.0.inner_mut();
        let pending = port.bytes_to_read().map_err(io::Error::from)?;
        if pending > 0 {
            trace!("Discarding {pending} pending bytes");
        }
        port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}
