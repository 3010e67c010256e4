// Status indicator controller
//
// The board carries one FireLed band, initialized lazily on the first
// indicator operation with a default brightness. Flashing runs as a
// detached tokio task cancelled cooperatively through a shared flag: the
// loop checks the flag between phases, so cancellation never interrupts
// an in-flight write or sleep and the band is left in whichever phase
// was mid-flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use super::{SharedIo, lock_io};
use crate::config;
use crate::link::{BoardIo, Result};

/// Predefined band colors
pub mod colors {
    pub const RED: u32 = 0xFF0000;
    pub const ORANGE: u32 = 0xFFA500;
    pub const YELLOW: u32 = 0xFFFF00;
    pub const GREEN: u32 = 0x00FF00;
    pub const BLUE: u32 = 0x0000FF;
    pub const INDIGO: u32 = 0x4B0082;
    pub const VIOLET: u32 = 0x8A2BE2;
    pub const PURPLE: u32 = 0xFF00FF;
    pub const WHITE: u32 = 0xFFFFFF;
    pub const BLACK: u32 = 0x000000;
}

/// Shortest accepted flash half-period; the band misbehaves on zero
pub const MIN_FLASH_DELAY: Duration = Duration::from_millis(1);

/// What a static color write does to a running flash.
///
/// The two DriveBit board revisions disagree here, so the choice is a
/// named configuration rather than a fixed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelPolicy {
    /// Cancel the flash before applying the static color
    #[default]
    CancelOnSet,
    /// Leave the flash running; it will overwrite the static color on
    /// its next half-period
    NoCancelOnSet,
}

/// Pack 8-bit channels into a 24-bit color.
///
/// Channels are masked, not clamped: `convert_rgb(256, 0, 0)` is black
/// and `convert_rgb(-1, 0, 0)` is full red.
pub fn convert_rgb(r: i32, g: i32, b: i32) -> u32 {
    (((r & 0xFF) << 16) | ((g & 0xFF) << 8) | (b & 0xFF)) as u32
}

/// Controller for the status band
pub struct Indicator<L> {
    io: SharedIo<L>,
    band_ready: Arc<AtomicBool>,
    flashing: Arc<AtomicBool>,
    policy: CancelPolicy,
}

impl<L: BoardIo + Send + 'static> Indicator<L> {
    pub(crate) fn new(io: SharedIo<L>, policy: CancelPolicy) -> Self {
        Self {
            io,
            band_ready: Arc::new(AtomicBool::new(false)),
            flashing: Arc::new(AtomicBool::new(false)),
            policy,
        }
    }

    // Band init is deferred until something actually uses the indicator.
    // Only ever called with the io mutex held, so check-then-set is safe.
    fn ensure_band(io: &mut L, ready: &AtomicBool) -> Result<()> {
        if !ready.load(Ordering::Relaxed) {
            debug!(
                "initializing led band: pin={} count={}",
                config::LED_PIN,
                config::LED_COUNT
            );
            io.led_init(config::LED_PIN, config::LED_COUNT)?;
            io.led_brightness(config::DEFAULT_BRIGHTNESS)?;
            ready.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    fn write_color(io: &SharedIo<L>, ready: &AtomicBool, rgb: u32) -> Result<()> {
        let io = &mut *lock_io(io);
        Self::ensure_band(io, ready)?;
        io.led_color(rgb)?;
        io.led_show()
    }

    fn write_clear(io: &SharedIo<L>, ready: &AtomicBool) -> Result<()> {
        let io = &mut *lock_io(io);
        Self::ensure_band(io, ready)?;
        io.led_clear()?;
        io.led_show()
    }

    /// Set the band to a static color.
    ///
    /// Under [`CancelPolicy::CancelOnSet`] a running flash is cancelled
    /// first; under [`CancelPolicy::NoCancelOnSet`] the flash keeps
    /// running and may repaint the band on its next tick.
    pub fn set_color(&self, rgb: u32) -> Result<()> {
        if self.policy == CancelPolicy::CancelOnSet {
            self.stop_flash();
        }
        Self::write_color(&self.io, &self.band_ready, rgb)
    }

    /// Switch the band off. Same cancel policy as [`Self::set_color`].
    pub fn clear(&self) -> Result<()> {
        if self.policy == CancelPolicy::CancelOnSet {
            self.stop_flash();
        }
        Self::write_clear(&self.io, &self.band_ready)
    }

    /// Brightness applies immediately, flashing or not
    pub fn set_brightness(&self, value: u8) -> Result<()> {
        let io = &mut *lock_io(&self.io);
        Self::ensure_band(io, &self.band_ready)?;
        io.led_brightness(value)?;
        io.led_show()
    }

    pub fn is_flashing(&self) -> bool {
        self.flashing.load(Ordering::Relaxed)
    }

    /// Start flashing `rgb` with `delay` per half-period.
    ///
    /// No-op when a flash is already running: the running cycle keeps its
    /// original color and timing. The task is detached; this returns
    /// immediately. Must be called from within a tokio runtime.
    pub fn start_flash(&self, rgb: u32, delay: Duration) {
        if self.flashing.swap(true, Ordering::Relaxed) {
            debug!("start_flash: already flashing, ignoring");
            return;
        }
        let delay = delay.max(MIN_FLASH_DELAY);

        let io = Arc::clone(&self.io);
        let ready = Arc::clone(&self.band_ready);
        let flashing = Arc::clone(&self.flashing);
        tokio::spawn(async move {
            debug!("flash task started: rgb={:06X} delay={:?}", rgb, delay);
            while flashing.load(Ordering::Relaxed) {
                if let Err(e) = Self::write_color(&io, &ready, rgb) {
                    warn!("flash write failed, stopping: {}", e);
                    flashing.store(false, Ordering::Relaxed);
                    break;
                }
                tokio::time::sleep(delay).await;

                if !flashing.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(e) = Self::write_clear(&io, &ready) {
                    warn!("flash clear failed, stopping: {}", e);
                    flashing.store(false, Ordering::Relaxed);
                    break;
                }
                tokio::time::sleep(delay).await;
            }
            debug!("flash task exited");
        });
    }

    /// Cooperative cancel: the flash loop exits at its next flag check.
    /// Idempotent; a no-op when nothing is flashing.
    pub fn stop_flash(&self) {
        self.flashing.store(false, Ordering::Relaxed);
    }
}
