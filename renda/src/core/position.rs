use std::fmt;
use std::time::Duration;

use renda_ipc::ClickButton;

/// Delay given to new positions and to loaded positions without one.
pub const DEFAULT_DELAY_MS: i64 = 100;

/// Sleep used when the delay text is not a number.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(10);

/// Shortest sleep between two clicks.
pub const MIN_DELAY: Duration = Duration::from_micros(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// Delay after a click, as entered by the user.
///
/// Text that does not parse as an integer is kept verbatim so the editor can
/// show it back; replay substitutes [`FALLBACK_DELAY`] for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delay {
    Millis(i64),
    Invalid(String),
}

impl Delay {
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(ms) => Delay::Millis(ms),
            Err(_) => Delay::Invalid(input.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Delay::Millis(_))
    }

    pub fn sleep_duration(&self) -> Duration {
        match self {
            Delay::Millis(ms) if *ms > 0 => Duration::from_millis(*ms as u64).max(MIN_DELAY),
            Delay::Millis(_) => MIN_DELAY,
            Delay::Invalid(_) => FALLBACK_DELAY,
        }
    }

    /// Value written to a macro document.
    pub fn persisted_millis(&self) -> i64 {
        match self {
            Delay::Millis(ms) => *ms,
            Delay::Invalid(_) => FALLBACK_DELAY.as_millis() as i64,
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Millis(DEFAULT_DELAY_MS)
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Millis(ms) => write!(f, "{}", ms),
            Delay::Invalid(text) => f.write_str(text),
        }
    }
}

/// One click target. `point` is `None` until something is captured into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub point: Option<Point>,
    pub delay: Delay,
    pub button: ClickButton,
}

impl Position {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn at(point: Point) -> Self {
        Self {
            point: Some(point),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_button(mut self, button: ClickButton) -> Self {
        self.button = button;
        self
    }

    pub fn is_unset(&self) -> bool {
        self.point.is_none()
    }
}
