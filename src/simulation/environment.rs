//! Shared world state
//!
//! The environment owns the occupancy grid, the per-expressway accident
//! state and the schedule of cars waiting to reenter.

use anyhow::{anyhow, Result};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::car::SimCar;
use super::config::SimConfig;
use super::traffic_condition::TrafficGrid;
use super::types::{CellKey, XWayId};
use super::xway::XWay;

/// Cars that left the road and are due back at a later tick
///
/// Any worker finishing a car's exit may insert; the driver takes the cars due
/// at the start of each tick.
#[derive(Debug, Default)]
pub struct ReentrySchedule {
    pending: Mutex<BTreeMap<u32, Vec<SimCar>>>,
}

impl ReentrySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<u32, Vec<SimCar>>>> {
        self.pending
            .lock()
            .map_err(|_| anyhow!("reentry schedule lock poisoned"))
    }

    pub fn schedule(&self, time: u32, car: SimCar) -> Result<()> {
        self.lock()?.entry(time).or_default().push(car);
        Ok(())
    }

    /// Remove and return the cars due at exactly `time`
    pub fn take_due(&self, time: u32) -> Result<Vec<SimCar>> {
        Ok(self.lock()?.remove(&time).unwrap_or_default())
    }

    /// Number of cars waiting across all future ticks
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.values().map(Vec::len).sum())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Earliest tick with a pending reentry
    pub fn next_due(&self) -> Result<Option<u32>> {
        Ok(self.lock()?.keys().next().copied())
    }
}

/// The simulated world, initialised once before the first tick
#[derive(Debug)]
pub struct Environment {
    pub config: SimConfig,
    pub grid: TrafficGrid,
    pub xways: Vec<XWay>,
    pub reentrants: ReentrySchedule,
    /// Current world tick
    pub time: u32,
}

impl Environment {
    pub fn new<R: Rng>(config: SimConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let grid = TrafficGrid::new(config.num_xways);
        let xways = (0..config.num_xways)
            .map(|i| XWay::new(XWayId(i), config.accident_interval, rng))
            .collect();

        Ok(Self {
            config,
            grid,
            xways,
            reentrants: ReentrySchedule::new(),
            time: 0,
        })
    }

    pub fn xway(&self, id: XWayId) -> Option<&XWay> {
        self.xways.get(id.0)
    }

    /// Whether the cell's expressway currently has a live accident
    pub fn has_accident(&self, key: CellKey) -> bool {
        self.grid.has_accident(key, &self.xways)
    }

    pub fn active_accidents(&self) -> usize {
        self.xways.iter().filter(|x| x.has_accident()).count()
    }
}
