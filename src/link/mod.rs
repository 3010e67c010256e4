// Hardware link to the DriveBit board
//
// One bridge carries two halves: raw pin IO for the motor H-bridges, and
// the FireLed band used as the status indicator.

pub mod mock;
pub mod serial;

pub use mock::{IoEvent, MockLink};
pub use serial::SerialLink;

/// Error types for board communication
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from board: {reason}")]
    InvalidResponse { reason: String },

    #[error("Checksum mismatch in board response")]
    ChecksumMismatch,

    #[error("Board rejected command with status 0x{status:02X}")]
    Nack { status: u8 },

    #[error("Timeout waiting for board response")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// IO surface of the board as seen by the control core.
///
/// The pin half writes the four analog PWM channels, their digital brake
/// lines, and the single shared PWM period register. The led half drives
/// the status band; `led_init` must be sent before any other led command
/// (the board side allocates the band on it).
pub trait BoardIo: Send {
    fn write_digital(&mut self, pin: u8, level: bool) -> Result<()>;
    fn write_analog(&mut self, pin: u8, duty: u16) -> Result<()>;
    fn set_analog_period(&mut self, pin: u8, micros: u32) -> Result<()>;

    fn led_init(&mut self, pin: u8, count: u8) -> Result<()>;
    fn led_brightness(&mut self, value: u8) -> Result<()>;
    fn led_color(&mut self, rgb: u32) -> Result<()>;
    fn led_clear(&mut self) -> Result<()>;
    fn led_show(&mut self) -> Result<()>;
}
