//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the environment, the active cars and every random source,
//! and drives the tick loop either as one linear scan or as one rayon task per
//! expressway.

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::io::Write;
use std::time::{Duration, Instant};

use super::car::SimCar;
use super::car_manager::{
    advance_cars, check_accidents, injection_count, reenter_car, spawn_car, TickShared,
};
use super::config::{ExecutionMode, SimConfig};
use super::emission::{EmissionCounters, EmissionTotals};
use super::environment::Environment;
use super::output::OutputSink;
use super::route::Route;
use super::tolls::{write_toll_file, TollLookup};
use super::types::CarId;

/// Ticks between progress lines in the debug log
const PROGRESS_INTERVAL: u32 = 600;

/// The active-car set, partitioned by expressway in parallel mode
#[derive(Debug)]
enum ActiveCars {
    Single(Vec<SimCar>),
    PerXWay(Vec<Vec<SimCar>>),
}

impl ActiveCars {
    fn new(mode: ExecutionMode, num_xways: usize) -> Self {
        match mode {
            ExecutionMode::SingleThreaded => ActiveCars::Single(Vec::new()),
            ExecutionMode::ParallelPerXWay => {
                ActiveCars::PerXWay((0..num_xways).map(|_| Vec::new()).collect())
            }
        }
    }

    fn push(&mut self, car: SimCar) {
        match self {
            ActiveCars::Single(cars) => cars.push(car),
            ActiveCars::PerXWay(buckets) => {
                if let Some(bucket) = buckets.get_mut(car.route.xway().0) {
                    bucket.push(car);
                }
            }
        }
    }

    fn buckets(&self) -> &[Vec<SimCar>] {
        match self {
            ActiveCars::Single(cars) => std::slice::from_ref(cars),
            ActiveCars::PerXWay(buckets) => buckets,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &SimCar> {
        self.buckets().iter().flatten()
    }

    fn len(&self) -> usize {
        self.buckets().iter().map(Vec::len).sum()
    }
}

/// Figures gathered over one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub cars_created: u32,
    pub reentries: u64,
    pub exits: u64,
    pub totals: EmissionTotals,
    /// Cars injected at each tick, indexed by tick
    pub injections: Vec<u32>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Mean injections per tick over `buckets` equal slices of the run
    pub fn injection_profile(&self, buckets: usize) -> Vec<f64> {
        let buckets = buckets.max(1);
        let size = self.injections.len().div_ceil(buckets).max(1);
        self.injections
            .chunks(size)
            .map(|chunk| {
                let sum: u64 = chunk.iter().map(|&n| u64::from(n)).sum();
                sum as f64 / chunk.len() as f64
            })
            .collect()
    }

    pub fn log(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Cars created: {}", self.cars_created);
        info!("Cars reentered: {}, exits: {}", self.reentries, self.exits);
        info!("Queries issued: {}", self.totals.queries);
        info!("Position reports (type 0): {}", self.totals.position_reports);
        info!("Current queries (type 2): {}", self.totals.current_queries);
        info!("Historical queries (type 3): {}", self.totals.historical_queries);
        info!("Total notifications: {}", self.totals.total);
        info!("Data generation time: {:.2?}", self.elapsed);
    }
}

/// The main simulation world
pub struct SimWorld {
    pub env: Environment,
    cars: ActiveCars,
    /// Injection, reentry routes and the single-threaded scan
    rng: StdRng,
    /// One source per expressway for parallel workers
    xway_rngs: Vec<StdRng>,
    counters: EmissionCounters,
    tolls: TollLookup,
    sink: OutputSink,
    next_car_id: u32,
    injections: Vec<u32>,
    reentries: u64,
    exits: u64,
}

impl SimWorld {
    /// Build the world for `config`, writing notifications to `sink`
    pub fn new(config: SimConfig, sink: OutputSink) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let env = Environment::new(config, &mut rng)?;
        let num_xways = env.config.num_xways;
        let xway_rngs = (0..num_xways).map(|_| StdRng::from_rng(&mut rng)).collect();

        Ok(Self {
            cars: ActiveCars::new(env.config.mode, num_xways),
            env,
            rng,
            xway_rngs,
            counters: EmissionCounters::new(),
            tolls: TollLookup::new(),
            sink,
            next_car_id: 0,
            injections: Vec::new(),
            reentries: 0,
            exits: 0,
        })
    }

    pub fn time(&self) -> u32 {
        self.env.time
    }

    /// Number of car ids handed out so far
    pub fn cars_created(&self) -> u32 {
        self.next_car_id
    }

    pub fn active_cars(&self) -> impl Iterator<Item = &SimCar> {
        self.cars.iter()
    }

    pub fn toll_lookup(&self) -> &TollLookup {
        &self.tolls
    }

    pub fn totals(&self) -> EmissionTotals {
        self.counters.totals()
    }

    pub fn injections(&self) -> &[u32] {
        &self.injections
    }

    fn next_id(&mut self) -> CarId {
        let id = CarId(self.next_car_id);
        self.next_car_id += 1;
        id
    }

    /// Create this tick's new cars on fresh routes
    fn inject_cars(&mut self, time: u32) {
        let count = injection_count(time, &self.env.config, &mut self.rng);
        self.injections.push(count);

        let num_xways = self.env.config.num_xways;
        for _ in 0..count {
            let id = self.next_id();
            let route = Route::random(num_xways, &mut self.rng);
            let car = spawn_car(id, route, time, &mut self.env.grid.view_mut());
            self.cars.push(car);
        }
    }

    /// Bring back the cars whose reentry falls on this tick
    fn reenter_cars(&mut self, time: u32) -> Result<()> {
        let due = self.env.reentrants.take_due(time)?;
        let num_xways = self.env.config.num_xways;
        for mut car in due {
            let route = Route::random(num_xways, &mut self.rng);
            reenter_car(&mut car, route, time, &mut self.env.grid.view_mut());
            self.cars.push(car);
            self.reentries += 1;
        }
        Ok(())
    }

    /// Run one simulated second
    pub fn tick(&mut self) -> Result<()> {
        let time = self.env.time;

        self.inject_cars(time);
        self.reenter_cars(time)?;

        let shared = TickShared {
            config: &self.env.config,
            reentrants: &self.env.reentrants,
            tolls: &self.tolls,
            sink: &self.sink,
            counters: &self.counters,
        };

        let exited = match &mut self.cars {
            ActiveCars::Single(cars) => {
                let mut grid = self.env.grid.view_mut();
                let exited = advance_cars(cars, &mut grid, &shared, &mut self.rng)?;
                for xway in self.env.xways.iter_mut() {
                    check_accidents(xway, cars, &grid, time, shared.config, &mut self.rng);
                }
                exited
            }
            ActiveCars::PerXWay(buckets) => {
                let views = self.env.grid.xway_views_mut();
                let per_xway: Vec<usize> = buckets
                    .par_iter_mut()
                    .zip(views.into_par_iter())
                    .zip(self.env.xways.par_iter_mut())
                    .zip(self.xway_rngs.par_iter_mut())
                    .map(|(((cars, mut grid), xway), rng)| -> Result<usize> {
                        let exited = advance_cars(cars, &mut grid, &shared, rng)?;
                        check_accidents(xway, cars, &grid, time, shared.config, rng);
                        Ok(exited)
                    })
                    .collect::<Result<Vec<_>>>()?;
                per_xway.into_iter().sum()
            }
        };
        self.exits += exited as u64;

        if time % PROGRESS_INTERVAL == 0 {
            debug!(
                "time {}: {} active cars, {} awaiting reentry, {} live accidents",
                time,
                self.cars.len(),
                self.env.reentrants.len()?,
                self.env.active_accidents()
            );
        }

        self.env.time += 1;
        Ok(())
    }

    /// Tick until the configured run length and flush the sink
    pub fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        info!(
            "Simulating {} seconds on {} expressway(s), {:?}",
            self.env.config.sim_length, self.env.config.num_xways, self.env.config.mode
        );

        while self.env.time < self.env.config.sim_length {
            self.tick()?;
        }
        self.sink.flush()?;

        Ok(self.report(started.elapsed()))
    }

    pub fn report(&self, elapsed: Duration) -> RunReport {
        RunReport {
            cars_created: self.next_car_id,
            reentries: self.reentries,
            exits: self.exits,
            totals: self.counters.totals(),
            injections: self.injections.clone(),
            elapsed,
        }
    }

    /// Write the toll file for every car id created during the run
    ///
    /// Returns the number of records written.
    pub fn write_tolls<W: Write>(&mut self, out: &mut W) -> Result<u64> {
        write_toll_file(
            out,
            self.next_car_id,
            self.env.config.num_xways,
            &self.tolls,
            &mut self.rng,
        )
    }
}
