//! Solar clock: wall-clock time to sun angle.
//!
//! The sun angle is a linear function of the hour: 90° at midnight, 0° at
//! noon, and negative in the afternoon. It is used directly as the polar
//! angle of the sun direction, so the sun sits at the zenith at noon.

use chrono::Timelike;

/// Local wall-clock time with minute resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClockTime {
    /// Hour of day, `0..=23`.
    pub hour: u32,
    /// Minute of hour, `0..=59`.
    pub minute: u32,
}

impl WallClockTime {
    /// Create a time, wrapping out-of-range values (`25:70` becomes `2:10`).
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            hour: (hour % 24 + minute / 60 % 24) % 24,
            minute: minute % 60,
        }
    }

    /// Build from a fractional hour such as `9.5` (09:30). Values outside
    /// `[0, 24)` wrap around the day; non-finite input maps to midnight.
    pub fn from_hours_fraction(hours: f64) -> Self {
        if !hours.is_finite() {
            return Self::new(0, 0);
        }
        let total_minutes = (hours * 60.0).round().rem_euclid(24.0 * 60.0) as u32;
        Self::new(total_minutes / 60, total_minutes % 60)
    }

    /// `hour + minute / 60`.
    pub fn hours_fraction(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0
    }
}

/// Sun angle in degrees for a fractional hour: `(1 - h / 12) * 90`.
///
/// Not clamped; afternoon hours produce negative angles.
pub fn sun_angle(hours_fraction: f64) -> f64 {
    (1.0 - hours_fraction / 12.0) * 90.0
}

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Sample the current time.
    fn now(&self) -> WallClockTime;
}

/// Reads the local time zone's clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> WallClockTime {
        let now = chrono::Local::now();
        WallClockTime::new(now.hour(), now.minute())
    }
}

/// Always reports the same time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedClock(pub WallClockTime);

impl Clock for FixedClock {
    fn now(&self) -> WallClockTime {
        self.0
    }
}

/// Derives the sun angle from a [`Clock`].
pub struct SolarClock {
    clock: Box<dyn Clock>,
}

impl SolarClock {
    /// Wrap an arbitrary clock.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Use the system clock.
    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// Use a fixed hour when one is given, the system clock otherwise.
    pub fn with_override(hour: Option<f64>) -> Self {
        match hour {
            Some(hours) => Self::new(FixedClock(WallClockTime::from_hours_fraction(hours))),
            None => Self::system(),
        }
    }

    /// Sample the clock once and return the sun angle in degrees.
    pub fn current_sun_angle(&self) -> f64 {
        let time = self.clock.now();
        let angle = sun_angle(time.hours_fraction());
        tracing::debug!(
            hour = time.hour,
            minute = time.minute,
            angle_degrees = angle,
            "Sampled sun angle"
        );
        angle
    }
}

impl std::fmt::Debug for SolarClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolarClock").finish_non_exhaustive()
    }
}
