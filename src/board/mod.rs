// DriveBit board control
//
// Provides:
// - Motor drive model (raw and percent-scale APIs, bias correction)
// - Status indicator with a cooperative flash task
// - Timed drive/spin helpers

mod driver;
pub mod indicator;
pub mod motors;

pub use driver::Board;
pub use indicator::{CancelPolicy, Indicator, MIN_FLASH_DELAY, colors, convert_rgb};
pub use motors::{
    Direction, MAX_BIAS, MAX_DUTY, Motor, MotorDrive, MotorPins, Steer, StopMode, pwm_period_us,
};

pub(crate) type SharedIo<L> = std::sync::Arc<std::sync::Mutex<L>>;

// All board IO funnels through this; nothing holds the guard across an await.
pub(crate) fn lock_io<L>(io: &SharedIo<L>) -> std::sync::MutexGuard<'_, L> {
    io.lock().expect("board io mutex poisoned")
}
