//! Run configuration for the simulation
//!
//! Only the tunables live here; the world geometry is fixed in `types`.

use anyhow::{bail, Result};

/// Default run length: three hours of simulated time
pub const DEFAULT_SIM_LENGTH: u32 = 10_800;

/// Default number of cars injected per tick per expressway before the curve multiplier
pub const DEFAULT_CARS_PER_TICK: u32 = 20;

/// Constant offset of the injection curve
pub const DEFAULT_CAR_MULTIPLIER_FACTOR: f64 = 0.8;

/// Default base accident interval, in minutes
pub const DEFAULT_ACCIDENT_INTERVAL: u32 = 10;

/// Default base wait before an accident clears, in minutes
pub const DEFAULT_ACCIDENT_CLEAR_WAIT: u32 = 10;

/// How cars are advanced each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One linear scan over every active car
    #[default]
    SingleThreaded,
    /// One task per expressway, joined at the end of every tick
    ParallelPerXWay,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub num_xways: usize,
    pub sim_length: u32,
    pub cars_per_tick: u32,
    pub car_multiplier_factor: f64,
    /// Minutes between the previous clearing (or start) and the next accident
    pub accident_interval: u32,
    /// Minutes an accident stays on the road
    pub accident_clear_wait: u32,
    pub mode: ExecutionMode,
    /// Seed for every random source; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_xways: 1,
            sim_length: DEFAULT_SIM_LENGTH,
            cars_per_tick: DEFAULT_CARS_PER_TICK,
            car_multiplier_factor: DEFAULT_CAR_MULTIPLIER_FACTOR,
            accident_interval: DEFAULT_ACCIDENT_INTERVAL,
            accident_clear_wait: DEFAULT_ACCIDENT_CLEAR_WAIT,
            mode: ExecutionMode::SingleThreaded,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.num_xways == 0 {
            bail!("at least one expressway is required");
        }
        if self.sim_length == 0 {
            bail!("simulation length must be at least one second");
        }
        if !self.car_multiplier_factor.is_finite() || self.car_multiplier_factor < 0.0 {
            bail!(
                "car multiplier factor must be a non-negative number, got {}",
                self.car_multiplier_factor
            );
        }
        Ok(())
    }
}
