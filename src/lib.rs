// Host-side control runtime for the DriveBit two-motor robot board.
//
// The board hangs off a serial bridge; this crate turns motion intents
// (drive, spin, differential steer) into per-channel PWM duty and brake
// writes, and drives the status FireLed band including a non-blocking
// flash mode.

pub mod board;
pub mod config;
pub mod link;
