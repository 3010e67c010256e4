// DriveBit serial bridge protocol
//
// Packet format: [0xA5, 0x5A, Opcode, Length, Params..., Checksum]
// Every command is acknowledged with a status frame: [0xA5, 0x5A, Status, Checksum]

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

use super::{BoardIo, LinkError, Result};

/// Default serial configuration for the board bridge
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Packet header bytes
const HEADER: [u8; 2] = [0xA5, 0x5A];

/// Command set understood by the bridge firmware
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Opcode {
    Ping = 0x01,

    // Pin half
    DigitalWrite = 0x10,
    AnalogWrite = 0x11,
    AnalogPeriod = 0x12,

    // FireLed half
    LedInit = 0x20,
    LedBrightness = 0x21,
    LedColor = 0x22,
    LedClear = 0x23,
    LedShow = 0x24,
}

/// Serial connection to the board bridge
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open a new connection to the board
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// Calculate checksum for a packet (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a packet with header and checksum
    fn build_packet(opcode: Opcode, params: &[u8]) -> Vec<u8> {
        let mut packet = Vec::with_capacity(5 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(opcode as u8);
        packet.push(params.len() as u8);
        packet.extend_from_slice(params);

        // Checksum over opcode, length, params
        let checksum_data = &packet[2..]; // skip header
        packet.push(Self::checksum(checksum_data));

        packet
    }

    /// Send a command and wait for its status ack
    fn command(&mut self, opcode: Opcode, params: &[u8]) -> Result<()> {
        let packet = Self::build_packet(opcode, params);
        debug!("Command {:?}: params={:02X?}", opcode, params);
        self.port.write_all(&packet)?;
        self.port.flush()?;
        self.read_ack()
    }

    /// Read a status ack frame
    fn read_ack(&mut self) -> Result<()> {
        let mut frame = [0u8; 4];
        self.port.read_exact(&mut frame).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                LinkError::Timeout
            } else {
                LinkError::Io(e)
            }
        })?;

        if frame[..2] != HEADER {
            return Err(LinkError::InvalidResponse {
                reason: format!("Invalid header: {:02X?}", &frame[..2]),
            });
        }

        let status = frame[2];
        if Self::checksum(&[status]) != frame[3] {
            return Err(LinkError::ChecksumMismatch);
        }

        if status != 0 {
            return Err(LinkError::Nack { status });
        }

        Ok(())
    }

    /// Ping the bridge to check that it's connected
    pub fn ping(&mut self) -> Result<bool> {
        match self.command(Opcode::Ping, &[]) {
            Ok(()) => Ok(true),
            Err(LinkError::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl BoardIo for SerialLink {
    fn write_digital(&mut self, pin: u8, level: bool) -> Result<()> {
        self.command(Opcode::DigitalWrite, &[pin, level as u8])
    }

    fn write_analog(&mut self, pin: u8, duty: u16) -> Result<()> {
        let d = duty.to_le_bytes();
        self.command(Opcode::AnalogWrite, &[pin, d[0], d[1]])
    }

    fn set_analog_period(&mut self, pin: u8, micros: u32) -> Result<()> {
        let m = micros.to_le_bytes();
        self.command(Opcode::AnalogPeriod, &[pin, m[0], m[1], m[2], m[3]])
    }

    fn led_init(&mut self, pin: u8, count: u8) -> Result<()> {
        self.command(Opcode::LedInit, &[pin, count])
    }

    fn led_brightness(&mut self, value: u8) -> Result<()> {
        self.command(Opcode::LedBrightness, &[value])
    }

    fn led_color(&mut self, rgb: u32) -> Result<()> {
        // 24-bit color, little-endian on the wire
        let c = rgb.to_le_bytes();
        self.command(Opcode::LedColor, &[c[0], c[1], c[2]])
    }

    fn led_clear(&mut self) -> Result<()> {
        self.command(Opcode::LedClear, &[])
    }

    fn led_show(&mut self) -> Result<()> {
        self.command(Opcode::LedShow, &[])
    }
}
