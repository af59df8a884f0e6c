//! Car spawning, per-tick advancement and accident arbitration
//!
//! These functions work on one collection of cars at a time, so the same code
//! drives the single-threaded scan and each per-expressway worker.

use anyhow::Result;
use log::debug;
use rand::Rng;
use std::collections::HashMap;

use super::car::{CarUpdateResult, SimCar};
use super::config::SimConfig;
use super::emission::EmissionCounters;
use super::environment::ReentrySchedule;
use super::output::OutputSink;
use super::route::Route;
use super::tolls::TollLookup;
use super::traffic_condition::GridView;
use super::types::{
    is_travel_lane, CarId, CellKey, Direction, XWayId, ACCIDENT_PARTNER_DISTANCE,
    UPDATE_INTERVAL,
};
use super::xway::{Accident, XWay};

/// Run-wide state every worker reads or appends to during a tick
pub struct TickShared<'a> {
    pub config: &'a SimConfig,
    pub reentrants: &'a ReentrySchedule,
    pub tolls: &'a TollLookup,
    pub sink: &'a OutputSink,
    pub counters: &'a EmissionCounters,
}

/// Create a car on its entrance ramp and register it in its cell
pub fn spawn_car(id: CarId, route: Route, time: u32, grid: &mut GridView<'_>) -> SimCar {
    let car = SimCar::new(id, route, time);
    car.enter(grid);
    car
}

/// Put a returning car back on the road with a new route
pub fn reenter_car(car: &mut SimCar, route: Route, time: u32, grid: &mut GridView<'_>) {
    car.re_enter(route, time);
    car.enter(grid);
    debug!(
        "car {} reentering xway {} at time {}",
        car.id.0,
        route.xway().0,
        time
    );
}

/// Number of cars to inject at tick `time`
///
/// Follows half a sine period over the run plus a constant and a random
/// offset, so arrivals rise towards the middle of the run and fall after it.
pub fn injection_count<R: Rng>(time: u32, config: &SimConfig, rng: &mut R) -> u32 {
    let phase = std::f64::consts::PI * f64::from(time) / f64::from(config.sim_length.max(1));
    let multiplier = phase.sin() + config.car_multiplier_factor + rng.random::<f64>();
    let count = multiplier * f64::from(config.cars_per_tick) * config.num_xways as f64;
    count.ceil().max(0.0) as u32
}

/// Advance every car in `cars` by one tick
///
/// Cars on their reporting cadence emit before moving; removable cars are
/// dropped after they report. Emitted lines go to the sink in one block and
/// historical queries are recorded for toll derivation.
///
/// # Arguments
/// * `cars` - The cars to advance; every car's cell must be inside `grid`
/// * `grid` - The cells of the expressways these cars drive on
/// * `shared` - Run-wide schedule, lookup, sink and counters
/// * `rng` - The random source for this collection
///
/// Returns the number of cars that exited this tick
pub fn advance_cars<R: Rng>(
    cars: &mut Vec<SimCar>,
    grid: &mut GridView<'_>,
    shared: &TickShared<'_>,
    rng: &mut R,
) -> Result<usize> {
    let mut lines = String::new();
    let mut historical = Vec::new();
    let mut retired = vec![false; cars.len()];
    let mut exited = 0;

    for (car, is_retired) in cars.iter_mut().zip(retired.iter_mut()) {
        if car.is_report_due() {
            let emission = car.emit(shared.counters, rng);
            if let Some(day) = emission.historical_day() {
                historical.push(((car.id, day), car.route.xway()));
            }
            emission.write_lines(&mut lines);

            if car.is_removable() {
                *is_retired = true;
                continue;
            }
        }

        if let CarUpdateResult::Exited { .. } = car.move_car(grid, shared.reentrants, rng)? {
            exited += 1;
        }
        car.update_time(UPDATE_INTERVAL);
    }

    let mut flags = retired.into_iter();
    cars.retain(|_| !flags.next().unwrap_or(false));

    shared.sink.write_block(&lines)?;
    if !historical.is_empty() {
        shared.tolls.record_all(historical)?;
    }
    Ok(exited)
}

/// Whether `candidate` is behind `first` and less than 1000 feet away
pub fn is_within_partner_distance(first: &SimCar, candidate: &SimCar) -> bool {
    let gap = match first.direction() {
        Direction::East => first.position.into_inner() - candidate.position.into_inner(),
        Direction::West => candidate.position.into_inner() - first.position.into_inner(),
    };
    (0.0..ACCIDENT_PARTNER_DISTANCE).contains(&gap)
}

fn is_accident_eligible(car: &SimCar, xway: XWayId) -> bool {
    car.route.xway() == xway
        && !car.has_been_in_accident()
        && !car.is_removable()
        && is_travel_lane(car.lane)
}

/// Find two eligible cars in one cell, halt them together and describe the
/// accident
///
/// The first eligible car (in collection order) that has a partner in its
/// cell wins; the partner is snapped onto its lane and position.
pub fn create_accident(
    xway: XWayId,
    cars: &mut [SimCar],
    grid: &GridView<'_>,
    time: u32,
) -> Option<Accident> {
    let all: &[SimCar] = cars;
    let index: HashMap<CarId, usize> = all
        .iter()
        .enumerate()
        .filter(|(_, car)| car.route.xway() == xway)
        .map(|(i, car)| (car.id, i))
        .collect();

    let (first, second, key) = all.iter().enumerate().find_map(|(i, car)| {
        if !is_accident_eligible(car, xway) {
            return None;
        }
        let key = car.cell_key();
        let partner = find_partner(car, key, all, &index, grid)?;
        Some((i, partner, key))
    })?;

    let (lane, position) = (cars[first].lane, cars[first].position);
    cars[first].stop_car();
    cars[second].stop_car();
    cars[second].target_stopped_car(lane, position);

    let accident = Accident::new(
        cars[first].id,
        cars[second].id,
        time,
        key.segment,
        key.direction,
    );
    debug!(
        "accident created on xway {} at {}: cars {} and {}, segment {}, direction {}, position {}",
        xway.0,
        time,
        accident.first.0,
        accident.second.0,
        accident.segment,
        accident.direction.index(),
        position
    );
    Some(accident)
}

fn find_partner(
    first: &SimCar,
    key: CellKey,
    cars: &[SimCar],
    index: &HashMap<CarId, usize>,
    grid: &GridView<'_>,
) -> Option<usize> {
    let cell = grid.cell(key)?;
    cell.cars()
        .filter(|id| *id != first.id)
        .filter_map(|id| index.get(&id).copied())
        .find(|&j| {
            let candidate = &cars[j];
            is_accident_eligible(candidate, key.xway) && is_within_partner_distance(first, candidate)
        })
}

/// Restart the cars of a cleared accident
pub fn release_accident(accident: &Accident, cars: &mut [SimCar]) {
    for car in cars.iter_mut().filter(|c| accident.cars().contains(&c.id)) {
        car.start_car();
    }
}

/// Run the accident lifecycle of one expressway for tick `time`
///
/// Clears a live accident whose time is up, then, if the expressway is free
/// and its next window has opened, tries to create a new one.
///
/// Returns `true` when an accident was created
pub fn check_accidents<R: Rng>(
    xway: &mut XWay,
    cars: &mut [SimCar],
    grid: &GridView<'_>,
    time: u32,
    config: &SimConfig,
    rng: &mut R,
) -> bool {
    if xway.clears_accident_at(time) {
        if let Some(accident) = xway.clear_accident(time, config.accident_interval, rng) {
            debug!(
                "accident cleared on xway {} at {}: cars {} and {}",
                xway.id.0, time, accident.first.0, accident.second.0
            );
            release_accident(&accident, cars);
        }
    }

    if !xway.accepts_accident_at(time) {
        return false;
    }

    match create_accident(xway.id, cars, grid, time) {
        Some(accident) => xway.turn_on_accident(accident, config.accident_clear_wait, rng),
        None => false,
    }
}
