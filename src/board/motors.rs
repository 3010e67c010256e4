// Motor drive model for the DriveBit H-bridges
//
// Strictly open-loop: speeds map straight to PWM duty, direction picks
// which pin of each forward/reverse pair carries the duty. Out-of-range
// input never errors, it saturates.

use tracing::debug;

use super::{SharedIo, lock_io};
use crate::config;
use crate::link::{BoardIo, Result};

/// Full-scale PWM duty
pub const MAX_DUTY: i32 = 1023;

/// Percent speed to raw duty expansion (100 % -> 1023)
const PCT_TO_DUTY: f32 = 10.23;

/// Largest accepted per-side bias percentage
pub const MAX_BIAS: u8 = 80;

/// Which physical motor(s) a command affects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motor {
    Left,
    Right,
    Both,
}

/// Travel direction for the percent-scale API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Rotation direction for in-place spins (and the side a bias slows down)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

/// How the robot comes to rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Release all channels to zero drive
    Coast,
    /// Zero drive, then latch the digital brake lines high
    Brake,
}

/// H-bridge pin assignment, one forward/reverse pair per side
#[derive(Debug, Clone, Copy)]
pub struct MotorPins {
    pub left_fwd: u8,
    pub left_rev: u8,
    pub right_fwd: u8,
    pub right_rev: u8,
}

impl Default for MotorPins {
    fn default() -> Self {
        Self {
            left_fwd: config::LEFT_FWD_PIN,
            left_rev: config::LEFT_REV_PIN,
            right_fwd: config::RIGHT_FWD_PIN,
            right_rev: config::RIGHT_REV_PIN,
        }
    }
}

impl MotorPins {
    fn all(&self) -> [u8; 4] {
        [self.left_fwd, self.left_rev, self.right_fwd, self.right_rev]
    }
}

/// PWM period in microseconds for a raw duty magnitude.
///
/// Low duty gets a longer period so the on-pulse stays wide enough to
/// keep torque; high duty gets a shorter period to cut switching whine.
pub fn pwm_period_us(magnitude: u16) -> u32 {
    if magnitude < 200 {
        60_000
    } else if magnitude < 300 {
        40_000
    } else {
        30_000
    }
}

/// Drive model over the four H-bridge channels
pub struct MotorDrive<L> {
    io: SharedIo<L>,
    pins: MotorPins,
    left_bias: u8,
    right_bias: u8,
}

impl<L: BoardIo> MotorDrive<L> {
    pub(crate) fn new(io: SharedIo<L>, pins: MotorPins) -> Self {
        Self {
            io,
            pins,
            left_bias: 0,
            right_bias: 0,
        }
    }

    // The board has a single period register for all channels, so the
    // magnitude of the latest command retunes every one of them.
    fn set_pwm_period(&self, io: &mut L, magnitude: u16) -> Result<()> {
        io.set_analog_period(self.pins.left_fwd, pwm_period_us(magnitude))
    }

    fn write_pair(io: &mut L, fwd: u8, rev: u8, duty: u16, reverse: bool) -> Result<()> {
        if reverse {
            io.write_analog(fwd, 0)?;
            io.write_analog(rev, duty)
        } else {
            io.write_analog(fwd, duty)?;
            io.write_analog(rev, 0)
        }
    }

    /// Drive the selected motor(s) at a signed raw speed, clamped to ±1023.
    pub fn set_speed(&mut self, motor: Motor, speed: i32) -> Result<()> {
        let speed = speed.clamp(-MAX_DUTY, MAX_DUTY);
        let duty = speed.unsigned_abs() as u16;
        let reverse = speed < 0;
        debug!(
            "set_speed: motor={:?} duty={} reverse={}",
            motor, duty, reverse
        );

        let io = &mut *lock_io(&self.io);
        self.set_pwm_period(io, duty)?;
        if matches!(motor, Motor::Left | Motor::Both) {
            Self::write_pair(io, self.pins.left_fwd, self.pins.left_rev, duty, reverse)?;
        }
        if matches!(motor, Motor::Right | Motor::Both) {
            Self::write_pair(io, self.pins.right_fwd, self.pins.right_rev, duty, reverse)?;
        }
        Ok(())
    }

    /// Drive both motors at a signed raw speed
    pub fn drive(&mut self, speed: i32) -> Result<()> {
        self.set_speed(Motor::Both, speed)
    }

    /// Rotate in place; a negative speed is treated as stationary
    pub fn spin(&mut self, steer: Steer, speed: i32) -> Result<()> {
        let speed = speed.max(0);
        match steer {
            Steer::Left => {
                self.set_speed(Motor::Left, -speed)?;
                self.set_speed(Motor::Right, speed)
            }
            Steer::Right => {
                self.set_speed(Motor::Left, speed)?;
                self.set_speed(Motor::Right, -speed)
            }
        }
    }

    /// Zero every duty; Brake additionally latches the digital brake lines
    pub fn stop(&mut self, mode: StopMode) -> Result<()> {
        debug!("stop: {:?}", mode);
        let io = &mut *lock_io(&self.io);
        for pin in self.pins.all() {
            io.write_analog(pin, 0)?;
        }
        if mode == StopMode::Brake {
            for pin in self.pins.all() {
                io.write_digital(pin, true)?;
            }
        }
        Ok(())
    }

    /// Drive both motors at a percent speed (0-100)
    pub fn go(&mut self, direction: Direction, pct: i32) -> Result<()> {
        self.move_motor(Motor::Both, direction, pct)
    }

    /// Percent-scale motor drive with per-side bias correction applied
    pub fn move_motor(&mut self, motor: Motor, direction: Direction, pct: i32) -> Result<()> {
        let raw = (pct.clamp(0, 100) as f32 * PCT_TO_DUTY).round() as u16;
        let reverse = direction == Direction::Reverse;
        let left = apply_bias(raw, self.left_bias);
        let right = apply_bias(raw, self.right_bias);
        debug!(
            "move: motor={:?} dir={:?} raw={} left={} right={}",
            motor, direction, raw, left, right
        );

        let io = &mut *lock_io(&self.io);
        self.set_pwm_period(io, raw)?;
        if matches!(motor, Motor::Left | Motor::Both) {
            Self::write_pair(io, self.pins.left_fwd, self.pins.left_rev, left, reverse)?;
        }
        if matches!(motor, Motor::Right | Motor::Both) {
            Self::write_pair(io, self.pins.right_fwd, self.pins.right_rev, right, reverse)?;
        }
        Ok(())
    }

    /// Rotate in place at a percent speed
    pub fn rotate(&mut self, steer: Steer, pct: i32) -> Result<()> {
        match steer {
            Steer::Left => {
                self.move_motor(Motor::Left, Direction::Reverse, pct)?;
                self.move_motor(Motor::Right, Direction::Forward, pct)
            }
            Steer::Right => {
                self.move_motor(Motor::Left, Direction::Forward, pct)?;
                self.move_motor(Motor::Right, Direction::Reverse, pct)
            }
        }
    }

    /// Slow one side down to straighten the robot's track.
    ///
    /// Only one side can carry a bias at a time; biasing left clears any
    /// right bias and vice versa.
    pub fn set_bias(&mut self, side: Steer, pct: u8) {
        let pct = pct.min(MAX_BIAS);
        match side {
            Steer::Left => {
                self.left_bias = pct;
                self.right_bias = 0;
            }
            Steer::Right => {
                self.left_bias = 0;
                self.right_bias = pct;
            }
        }
        debug!("bias: left={} right={}", self.left_bias, self.right_bias);
    }

    /// Current (left, right) bias percentages
    pub fn bias(&self) -> (u8, u8) {
        (self.left_bias, self.right_bias)
    }
}

fn apply_bias(raw: u16, bias: u8) -> u16 {
    // round(raw * (100 - bias) / 100)
    ((raw as u32 * (100 - bias as u32) + 50) / 100) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MockLink;
    use std::sync::{Arc, Mutex};

    const LF: u8 = config::LEFT_FWD_PIN;
    const LR: u8 = config::LEFT_REV_PIN;
    const RF: u8 = config::RIGHT_FWD_PIN;
    const RR: u8 = config::RIGHT_REV_PIN;

    fn drive_on(link: &MockLink) -> MotorDrive<MockLink> {
        MotorDrive::new(Arc::new(Mutex::new(link.clone())), MotorPins::default())
    }

    #[test]
    fn test_period_tiers() {
        assert_eq!(pwm_period_us(0), 60_000);
        assert_eq!(pwm_period_us(199), 60_000);
        assert_eq!(pwm_period_us(200), 40_000);
        assert_eq!(pwm_period_us(299), 40_000);
        assert_eq!(pwm_period_us(300), 30_000);
        assert_eq!(pwm_period_us(1023), 30_000);
    }

    #[test]
    fn test_forward_pin_pattern() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.drive(600).unwrap();

        assert_eq!(link.analog(LF), 600);
        assert_eq!(link.analog(LR), 0);
        assert_eq!(link.analog(RF), 600);
        assert_eq!(link.analog(RR), 0);
        assert_eq!(link.period(LF), Some(30_000));
    }

    #[test]
    fn test_reverse_pin_pattern() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.drive(-150).unwrap();

        assert_eq!(link.analog(LF), 0);
        assert_eq!(link.analog(LR), 150);
        assert_eq!(link.analog(RF), 0);
        assert_eq!(link.analog(RR), 150);
        assert_eq!(link.period(LF), Some(60_000));
    }

    #[test]
    fn test_speed_clamps_to_full_scale() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.drive(40_000).unwrap();
        assert_eq!(link.analog(LF), 1023);

        drive.drive(-40_000).unwrap();
        assert_eq!(link.analog(LR), 1023);
        assert_eq!(link.analog(LF), 0);
    }

    #[test]
    fn test_single_motor_leaves_other_side_alone() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.set_speed(Motor::Left, 500).unwrap();

        assert_eq!(link.analog(LF), 500);
        assert_eq!(link.analog(RF), 0);
        assert_eq!(link.analog(RR), 0);
    }

    #[test]
    fn test_period_register_is_shared_last_call_wins() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.set_speed(Motor::Left, 100).unwrap();
        assert_eq!(link.period(LF), Some(60_000));

        // The right motor's magnitude retunes the left channel too
        drive.set_speed(Motor::Right, 600).unwrap();
        assert_eq!(link.period(LF), Some(30_000));
    }

    #[test]
    fn test_spin_left_is_opposite_signed() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.spin(Steer::Left, 600).unwrap();

        assert_eq!(link.analog(LF), 0);
        assert_eq!(link.analog(LR), 600);
        assert_eq!(link.analog(RF), 600);
        assert_eq!(link.analog(RR), 0);
    }

    #[test]
    fn test_spin_negative_speed_is_stationary() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.spin(Steer::Right, -600).unwrap();

        for pin in [LF, LR, RF, RR] {
            assert_eq!(link.analog(pin), 0);
        }
    }

    #[test]
    fn test_stop_coast_zeroes_duty_only() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.drive(1023).unwrap();
        drive.stop(StopMode::Coast).unwrap();

        for pin in [LF, LR, RF, RR] {
            assert_eq!(link.analog(pin), 0);
        }
        assert!(!link.any_digital_writes());
    }

    #[test]
    fn test_stop_brake_latches_digital_lines() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.drive(1023).unwrap();
        drive.stop(StopMode::Brake).unwrap();

        for pin in [LF, LR, RF, RR] {
            assert_eq!(link.analog(pin), 0);
            assert!(link.digital(pin));
        }
    }

    #[test]
    fn test_percent_scale_expansion() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.go(Direction::Forward, 100).unwrap();
        assert_eq!(link.analog(LF), 1023);
        assert_eq!(link.analog(RF), 1023);

        drive.go(Direction::Forward, 250).unwrap(); // clamps to 100 %
        assert_eq!(link.analog(LF), 1023);

        drive.go(Direction::Reverse, 60).unwrap();
        assert_eq!(link.analog(LR), 614); // round(60 * 10.23)
        assert_eq!(link.analog(LF), 0);
    }

    #[test]
    fn test_unbiased_move_is_symmetric() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.go(Direction::Forward, 73).unwrap();
        assert_eq!(link.analog(LF), link.analog(RF));
    }

    #[test]
    fn test_bias_slows_one_side_inside_move() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.set_bias(Steer::Left, 10);
        drive.go(Direction::Forward, 100).unwrap();

        assert_eq!(link.analog(LF), 921); // round(1023 * 90 / 100)
        assert_eq!(link.analog(RF), 1023);
    }

    #[test]
    fn test_bias_sides_are_mutually_exclusive() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.set_bias(Steer::Left, 20);
        assert_eq!(drive.bias(), (20, 0));

        drive.set_bias(Steer::Right, 35);
        assert_eq!(drive.bias(), (0, 35));

        drive.set_bias(Steer::Left, 0);
        assert_eq!(drive.bias(), (0, 0));
    }

    #[test]
    fn test_bias_clamps_to_max() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.set_bias(Steer::Right, 200);
        assert_eq!(drive.bias(), (0, MAX_BIAS));
    }

    #[test]
    fn test_bias_does_not_touch_raw_api() {
        let link = MockLink::new();
        let mut drive = drive_on(&link);
        drive.set_bias(Steer::Left, 50);
        drive.drive(1000).unwrap();
        assert_eq!(link.analog(LF), 1000);
        assert_eq!(link.analog(RF), 1000);
    }
}
