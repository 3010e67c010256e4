// High-level board facade
//
// Owns the shared link and hands out the two control halves (motor drive
// and status indicator), plus the "do X, hold, then stop" helpers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use super::indicator::{CancelPolicy, Indicator};
use super::motors::{MotorDrive, MotorPins, Steer, StopMode};
use crate::link::{BoardIo, Result};

/// One DriveBit board: two motors and a status band behind one link
pub struct Board<L> {
    motors: MotorDrive<L>,
    indicator: Indicator<L>,
}

impl<L: BoardIo + Send + 'static> Board<L> {
    /// Create a board with the default wiring and cancel policy
    pub fn new(link: L) -> Self {
        Self::with_config(link, MotorPins::default(), CancelPolicy::default())
    }

    /// Create with custom pin assignment and flash-cancel policy
    pub fn with_config(link: L, pins: MotorPins, policy: CancelPolicy) -> Self {
        info!("Board up: pins={:?} cancel policy={:?}", pins, policy);
        let io = Arc::new(Mutex::new(link));
        Self {
            motors: MotorDrive::new(Arc::clone(&io), pins),
            indicator: Indicator::new(io, policy),
        }
    }

    pub fn motors(&mut self) -> &mut MotorDrive<L> {
        &mut self.motors
    }

    pub fn indicator(&self) -> &Indicator<L> {
        &self.indicator
    }

    /// Run a motion action, hold it for `duration`, then stop.
    ///
    /// The sleep is a cooperative suspension point; background tasks (the
    /// flash loop) keep running through it.
    pub async fn run_for(
        &mut self,
        duration: Duration,
        stop_mode: StopMode,
        action: impl FnOnce(&mut MotorDrive<L>) -> Result<()>,
    ) -> Result<()> {
        action(&mut self.motors)?;
        tokio::time::sleep(duration).await;
        self.motors.stop(stop_mode)
    }

    /// Drive at a signed raw speed for `duration`, then coast to a stop
    pub async fn drive_for(&mut self, speed: i32, duration: Duration) -> Result<()> {
        self.run_for(duration, StopMode::Coast, |m| m.drive(speed)).await
    }

    /// Spin in place for `duration`, then coast to a stop
    pub async fn spin_for(&mut self, steer: Steer, speed: i32, duration: Duration) -> Result<()> {
        self.run_for(duration, StopMode::Coast, move |m| m.spin(steer, speed))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::link::{IoEvent, MockLink};
    use tokio::time::Instant;

    const ALL_PINS: [u8; 4] = [
        config::LEFT_FWD_PIN,
        config::LEFT_REV_PIN,
        config::RIGHT_FWD_PIN,
        config::RIGHT_REV_PIN,
    ];

    #[tokio::test(start_paused = true)]
    async fn test_drive_for_holds_then_coasts() {
        let link = MockLink::new();
        let mut board = Board::new(link.clone());

        let start = Instant::now();
        board
            .drive_for(-1023, Duration::from_millis(300))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(300));

        for pin in ALL_PINS {
            assert_eq!(link.analog(pin), 0);
        }
        // Coast: the brake lines were never driven
        assert!(!link.any_digital_writes());

        // Exactly one stop: period + 4 drive writes, then 4 zeroing writes
        let zero_writes = link
            .events()
            .iter()
            .filter(|e| matches!(e, IoEvent::Analog { duty: 0, .. }))
            .count();
        assert_eq!(link.event_count(), 9);
        assert_eq!(zero_writes, 6); // 2 forward pins during drive + 4 at stop
    }

    #[tokio::test(start_paused = true)]
    async fn test_spin_for_stops_after_duration() {
        let link = MockLink::new();
        let mut board = Board::new(link.clone());

        board
            .spin_for(Steer::Right, 600, Duration::from_millis(400))
            .await
            .unwrap();

        for pin in ALL_PINS {
            assert_eq!(link.analog(pin), 0);
        }
        assert!(!link.any_digital_writes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_for_can_brake() {
        let link = MockLink::new();
        let mut board = Board::new(link.clone());

        board
            .run_for(Duration::from_millis(100), StopMode::Brake, |m| m.drive(600))
            .await
            .unwrap();

        for pin in ALL_PINS {
            assert_eq!(link.analog(pin), 0);
            assert!(link.digital(pin));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_keeps_running_through_timed_drive() {
        let link = MockLink::new();
        let mut board = Board::new(link.clone());

        board
            .indicator()
            .start_flash(crate::board::colors::BLUE, Duration::from_millis(100));
        board
            .drive_for(1023, Duration::from_millis(250))
            .await
            .unwrap();
        board.indicator().stop_flash();

        // On/off phases landed inside the drive's hold window
        let toggles = link
            .events()
            .iter()
            .filter(|e| matches!(e, IoEvent::LedColor(_) | IoEvent::LedClear))
            .count();
        assert!(toggles >= 3);
    }
}
