//! Per-expressway accident state
//!
//! Each expressway carries at most one live accident plus the two times that
//! drive its lifecycle: when the next accident may start and when the
//! current one clears.

use log::debug;
use rand::Rng;

use super::types::{min_to_sec, CarId, Direction, XWayId, ACCIDENT_JITTER_MINUTES};

/// Two halted cars blocking one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accident {
    pub first: CarId,
    pub second: CarId,
    pub time: u32,
    pub segment: usize,
    pub direction: Direction,
}

impl Accident {
    pub fn new(first: CarId, second: CarId, time: u32, segment: usize, direction: Direction) -> Self {
        Self {
            first,
            second,
            time,
            segment,
            direction,
        }
    }

    pub fn cars(&self) -> [CarId; 2] {
        [self.first, self.second]
    }
}

#[derive(Debug, Clone)]
pub struct XWay {
    pub id: XWayId,
    accident: Option<Accident>,
    next_accident_time: u32,
    clear_accident_time: u32,
}

impl XWay {
    /// A fresh expressway, first accident window anchored at time zero
    pub fn new<R: Rng>(id: XWayId, accident_interval: u32, rng: &mut R) -> Self {
        Self {
            id,
            accident: None,
            next_accident_time: jittered_seconds(accident_interval, rng),
            clear_accident_time: 0,
        }
    }

    pub fn has_accident(&self) -> bool {
        self.accident.is_some()
    }

    pub fn accident(&self) -> Option<&Accident> {
        self.accident.as_ref()
    }

    pub fn next_accident_time(&self) -> u32 {
        self.next_accident_time
    }

    pub fn clear_accident_time(&self) -> u32 {
        self.clear_accident_time
    }

    /// Whether a new accident may be created at `time`
    pub fn accepts_accident_at(&self, time: u32) -> bool {
        !self.has_accident() && time > self.next_accident_time
    }

    /// Whether the live accident is due to clear at `time`
    pub fn clears_accident_at(&self, time: u32) -> bool {
        self.has_accident() && time > self.clear_accident_time
    }

    /// Install an accident and schedule its clearing
    ///
    /// Returns `false` and leaves the expressway untouched if an accident is
    /// already live.
    pub fn turn_on_accident<R: Rng>(
        &mut self,
        accident: Accident,
        clear_wait: u32,
        rng: &mut R,
    ) -> bool {
        if self.accident.is_some() {
            return false;
        }
        self.clear_accident_time = accident.time + jittered_seconds(clear_wait, rng);
        debug!(
            "xway {}: accident to be cleared at {}",
            self.id.0, self.clear_accident_time
        );
        self.accident = Some(accident);
        true
    }

    /// Drop the live accident and open the next accident window from `time`
    ///
    /// The caller restarts the returned accident's cars.
    pub fn clear_accident<R: Rng>(
        &mut self,
        time: u32,
        accident_interval: u32,
        rng: &mut R,
    ) -> Option<Accident> {
        let accident = self.accident.take()?;
        self.next_accident_time = time + jittered_seconds(accident_interval, rng);
        debug!(
            "xway {}: next accident window opens at {}",
            self.id.0, self.next_accident_time
        );
        Some(accident)
    }
}

/// `base_minutes` in seconds, moved up or down by up to five minutes
pub fn jittered_seconds<R: Rng>(base_minutes: u32, rng: &mut R) -> u32 {
    let base = f64::from(min_to_sec(base_minutes));
    let jitter = rng.random::<f64>() * f64::from(min_to_sec(ACCIDENT_JITTER_MINUTES));
    let seconds = if rng.random_bool(0.5) {
        base + jitter
    } else {
        base - jitter
    };
    seconds.max(0.0) as u32
}
