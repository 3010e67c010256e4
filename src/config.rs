// Board wiring and serial defaults

// Serial port of the board bridge
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

// Motor H-bridge pin pairs, fixed by board wiring.
// Each analog channel doubles as a digital brake line.
pub const LEFT_FWD_PIN: u8 = 12;
pub const LEFT_REV_PIN: u8 = 13;
pub const RIGHT_FWD_PIN: u8 = 14;
pub const RIGHT_REV_PIN: u8 = 15;

// Status FireLed band
pub const LED_PIN: u8 = 16;
pub const LED_COUNT: u8 = 1;
pub const DEFAULT_BRIGHTNESS: u8 = 40;
