// In-memory board for tests and --simulate runs
//
// `MockLink` is a cloneable handle over shared recorded state, so a test
// can keep one handle for inspection while the board owns the IO side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BoardIo, Result};

/// One recorded IO call, in issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoEvent {
    Digital { pin: u8, level: bool },
    Analog { pin: u8, duty: u16 },
    Period { pin: u8, micros: u32 },
    LedInit { pin: u8, count: u8 },
    LedBrightness(u8),
    LedColor(u32),
    LedClear,
    LedShow,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<IoEvent>,
    digital: HashMap<u8, bool>,
    analog: HashMap<u8, u16>,
    period: HashMap<u8, u32>,
}

#[derive(Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().expect("mock state poisoned"))
    }

    /// All recorded events so far
    pub fn events(&self) -> Vec<IoEvent> {
        self.with_state(|s| s.events.clone())
    }

    pub fn event_count(&self) -> usize {
        self.with_state(|s| s.events.len())
    }

    /// Current duty on a pin (0 if never written)
    pub fn analog(&self, pin: u8) -> u16 {
        self.with_state(|s| s.analog.get(&pin).copied().unwrap_or(0))
    }

    /// Current level on a digital pin (low if never written)
    pub fn digital(&self, pin: u8) -> bool {
        self.with_state(|s| s.digital.get(&pin).copied().unwrap_or(false))
    }

    /// Last PWM period set on a pin, if any
    pub fn period(&self, pin: u8) -> Option<u32> {
        self.with_state(|s| s.period.get(&pin).copied())
    }

    /// True if any digital write has been recorded
    pub fn any_digital_writes(&self) -> bool {
        self.with_state(|s| !s.digital.is_empty())
    }
}

impl BoardIo for MockLink {
    fn write_digital(&mut self, pin: u8, level: bool) -> Result<()> {
        self.with_state(|s| {
            s.events.push(IoEvent::Digital { pin, level });
            s.digital.insert(pin, level);
        });
        Ok(())
    }

    fn write_analog(&mut self, pin: u8, duty: u16) -> Result<()> {
        self.with_state(|s| {
            s.events.push(IoEvent::Analog { pin, duty });
            s.analog.insert(pin, duty);
        });
        Ok(())
    }

    fn set_analog_period(&mut self, pin: u8, micros: u32) -> Result<()> {
        self.with_state(|s| {
            s.events.push(IoEvent::Period { pin, micros });
            s.period.insert(pin, micros);
        });
        Ok(())
    }

    fn led_init(&mut self, pin: u8, count: u8) -> Result<()> {
        self.with_state(|s| s.events.push(IoEvent::LedInit { pin, count }));
        Ok(())
    }

    fn led_brightness(&mut self, value: u8) -> Result<()> {
        self.with_state(|s| s.events.push(IoEvent::LedBrightness(value)));
        Ok(())
    }

    fn led_color(&mut self, rgb: u32) -> Result<()> {
        self.with_state(|s| s.events.push(IoEvent::LedColor(rgb)));
        Ok(())
    }

    fn led_clear(&mut self) -> Result<()> {
        self.with_state(|s| s.events.push(IoEvent::LedClear));
        Ok(())
    }

    fn led_show(&mut self) -> Result<()> {
        self.with_state(|s| s.events.push(IoEvent::LedShow));
        Ok(())
    }
}
