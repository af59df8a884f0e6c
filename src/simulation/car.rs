//! Car movement logic for the traffic simulation
//!
//! A car advances one simulated second per call to `move_car`, keeps its
//! occupancy cell in sync with its position, and decides its speed for the
//! next tick from its lane and the congestion around it.

use anyhow::Result;
use log::debug;
use ordered_float::OrderedFloat;
use rand::Rng;

use super::emission::{
    Emission, EmissionCounters, Notification, NotificationKind, CURRENT_QUERY_SHARE,
    HISTORICAL_QUERY_SHARE, QUERY_PROBABILITY,
};
use super::environment::ReentrySchedule;
use super::route::Route;
use super::traffic_condition::GridView;
use super::types::{
    is_travel_lane, CarId, CellKey, Direction, ACCELERATION_ENTRANCE, ACCELERATION_TRAVEL,
    CONGESTION_STEP_CARS_PER_LANE, ENTRANCE_LANE, ENTRY_SPEED, EXIT_LANE, FEET_PER_SEGMENT,
    FULL_SPEED_CARS_PER_LANE, HISTORICAL_DAY_FIRST, HISTORICAL_DAY_LAST,
    MAX_LANE_CHANGE_SPEED_DELTA, MAX_POSITION, MAX_SPEED, MAX_SPEED_ENTRANCE, MAX_SPEED_EXIT,
    NUM_SEGMENTS, NUM_TRAVEL_LANES, REENTRANT_PERCENT, REENTRY_DELAY_MAX, REENTRY_DELAY_MIN,
    SPEED_FUDGE, SPEED_LIMIT, TIME_INTERVAL, TRAVEL_LANE_CHANGE_PROBABILITY, UPDATE_INTERVAL,
};

/// Result of a car update indicating what the driver should know about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    Continue,
    /// The car reached its exit segment this tick
    Exited { reentry_at: Option<u32> },
}

/// Coordinates a car drives to before halting next to an accident
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarTarget {
    pub lane: u8,
    pub position: OrderedFloat<f64>,
}

/// A car in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    pub route: Route,
    /// Feet from the start of the expressway
    pub position: OrderedFloat<f64>,
    pub speed: i32,
    pub last_speed: i32,
    pub lane: u8,
    pub start_time: u32,
    pub time: u32,
    removable: bool,
    is_accident_car: bool,
    has_been_in_accident: bool,
    target: Option<CarTarget>,
}

impl SimCar {
    /// A car waiting on the entrance ramp of its route
    ///
    /// The car is not yet registered in any cell; see `enter`.
    pub fn new(id: CarId, route: Route, start_time: u32) -> Self {
        let mut car = Self {
            id,
            route,
            position: OrderedFloat(0.0),
            speed: ENTRY_SPEED,
            last_speed: 0,
            lane: ENTRANCE_LANE,
            start_time,
            time: start_time,
            removable: false,
            is_accident_car: false,
            has_been_in_accident: false,
            target: None,
        };
        car.reset(route, start_time);
        car
    }

    /// Put an exited car back on the road with a new route, keeping its id
    /// and accident history
    pub fn re_enter(&mut self, route: Route, start_time: u32) {
        self.reset(route, start_time);
    }

    fn reset(&mut self, route: Route, start_time: u32) {
        self.route = route;
        self.start_time = start_time;
        self.time = start_time;
        self.speed = ENTRY_SPEED;
        self.last_speed = 0;
        // The last segment's westbound start lies past the end of the road
        self.set_position(Self::seg_to_beginning_position(
            route.entrance_segment(),
            route.direction(),
        ));
        self.lane = ENTRANCE_LANE;
        self.removable = false;
        self.is_accident_car = false;
        self.target = None;
    }

    /// Register the car in the cell matching its current position
    pub fn enter(&self, grid: &mut GridView<'_>) {
        grid.add_car(self.cell_key(), self.id);
    }

    /// First foot of a segment in the direction of travel
    pub fn seg_to_beginning_position(segment: usize, direction: Direction) -> f64 {
        let start = (segment * FEET_PER_SEGMENT) as f64;
        match direction {
            Direction::East => start,
            Direction::West => start + (FEET_PER_SEGMENT - 1) as f64,
        }
    }

    pub fn segment_for_position(position: f64) -> usize {
        let segment = (position / FEET_PER_SEGMENT as f64).floor().max(0.0) as usize;
        segment.min(NUM_SEGMENTS - 1)
    }

    pub fn mph_to_feet_per_sec(speed: f64) -> f64 {
        speed / 3600.0 * 5280.0
    }

    pub fn segment(&self) -> usize {
        Self::segment_for_position(self.position.into_inner())
    }

    pub fn direction(&self) -> Direction {
        self.route.direction()
    }

    pub fn cell_key(&self) -> CellKey {
        CellKey::new(self.route.xway(), self.segment(), self.route.direction())
    }

    pub fn average_speed(&self) -> f64 {
        f64::from(self.speed + self.last_speed) / 2.0
    }

    /// Feet covered in `seconds` at the average of the last two speeds
    pub fn distance_traveled(&self, seconds: u32) -> f64 {
        Self::mph_to_feet_per_sec(self.average_speed()) * f64::from(seconds)
    }

    pub fn is_removable(&self) -> bool {
        self.removable
    }

    pub fn is_accident_car(&self) -> bool {
        self.is_accident_car
    }

    /// Set on the first accident and never cleared
    pub fn has_been_in_accident(&self) -> bool {
        self.has_been_in_accident
    }

    pub fn target(&self) -> Option<CarTarget> {
        self.target
    }

    /// Whether this car is on its reporting cadence at its current time
    pub fn is_report_due(&self) -> bool {
        (self.time - self.start_time) % TIME_INTERVAL == 0
    }

    pub fn update_time(&mut self, delta: u32) {
        self.time += delta;
    }

    fn set_position(&mut self, position: f64) {
        self.position = OrderedFloat(position.clamp(0.0, MAX_POSITION));
    }

    /// Advance the car one tick
    pub fn move_car<R: Rng>(
        &mut self,
        grid: &mut GridView<'_>,
        reentrants: &ReentrySchedule,
        rng: &mut R,
    ) -> Result<CarUpdateResult> {
        if self.is_accident_car {
            return Ok(CarUpdateResult::Continue);
        }

        if let Some(target) = self.target {
            self.chase(target, grid);
            return Ok(CarUpdateResult::Continue);
        }

        let previous = self.cell_key();
        let delta = self.distance_traveled(UPDATE_INTERVAL);
        self.set_position(self.position.into_inner() + self.direction().sign() * delta);

        let current = self.cell_key();
        if !self.removable {
            grid.transfer_car(previous, current, self.id);
        }

        let mut result = CarUpdateResult::Continue;
        if current.segment == self.route.exit_segment() && !self.removable {
            result = self.exit_xway(grid, reentrants, rng)?;
        } else if self.lane == ENTRANCE_LANE
            && Some(current.segment) == self.route.first_travel_segment()
        {
            self.lane = ENTRANCE_LANE + 1;
        }

        self.update_speed(grid, rng);
        Ok(result)
    }

    /// Drive flat out towards the target and halt on reaching it
    fn chase(&mut self, target: CarTarget, grid: &mut GridView<'_>) {
        let previous = self.cell_key();
        self.lane = target.lane;
        self.last_speed = self.speed;
        self.speed = MAX_SPEED;

        let next = self.position.into_inner()
            + self.direction().sign() * self.distance_traveled(UPDATE_INTERVAL);
        let reached = match self.direction() {
            Direction::East => next >= target.position.into_inner(),
            Direction::West => next <= target.position.into_inner(),
        };

        if reached {
            self.set_position(target.position.into_inner());
            self.stop_car();
        } else {
            self.set_position(next);
        }

        if !self.removable {
            grid.transfer_car(previous, self.cell_key(), self.id);
        }
    }

    /// Take the exit: leave the cell, possibly book a later reentry
    fn exit_xway<R: Rng>(
        &mut self,
        grid: &mut GridView<'_>,
        reentrants: &ReentrySchedule,
        rng: &mut R,
    ) -> Result<CarUpdateResult> {
        self.lane = EXIT_LANE;
        self.removable = true;

        let mut reentry_at = None;
        if rng.random_bool(REENTRANT_PERCENT) {
            let at = self.time + rng.random_range(REENTRY_DELAY_MIN..REENTRY_DELAY_MAX);
            reentrants.schedule(at, self.clone())?;
            reentry_at = Some(at);
        }

        grid.remove_car(self.cell_key(), self.id);
        Ok(CarUpdateResult::Exited { reentry_at })
    }

    /// Speed reduction caused by the number of cars sharing a cell
    pub fn congestion_penalty(num_cars: usize) -> i32 {
        let safe_cars = FULL_SPEED_CARS_PER_LANE * NUM_TRAVEL_LANES;
        let step = CONGESTION_STEP_CARS_PER_LANE * NUM_TRAVEL_LANES;
        if num_cars <= safe_cars {
            return 0;
        }
        let steps = ((num_cars - safe_cars - 1) / step + 1).min(5);
        steps as i32 * 10
    }

    fn update_speed<R: Rng>(&mut self, grid: &GridView<'_>, rng: &mut R) {
        self.last_speed = self.speed;

        if self.is_accident_car {
            self.speed = 0;
            return;
        }

        let penalty = Self::congestion_penalty(grid.num_cars(self.cell_key()));

        match self.lane {
            ENTRANCE_LANE if self.speed < MAX_SPEED_ENTRANCE => {
                self.speed += rng.random_range(0..ACCELERATION_ENTRANCE) * UPDATE_INTERVAL as i32;
                let cap = MAX_SPEED_ENTRANCE - penalty;
                if self.speed > cap {
                    self.speed = cap + fudge(SPEED_FUDGE / 2, rng);
                }
                self.speed = self.speed.max(0);
            }
            lane if is_travel_lane(lane) => {
                if rng.random_bool(TRAVEL_LANE_CHANGE_PROBABILITY) {
                    self.change_lane(rng);
                } else {
                    self.speed += rng.random_range(0..ACCELERATION_TRAVEL) * UPDATE_INTERVAL as i32;
                    let cap = SPEED_LIMIT - penalty;
                    if self.speed > cap {
                        self.speed = cap + fudge(SPEED_FUDGE, rng);
                    }
                }
                self.speed = self.speed.max(0);
            }
            EXIT_LANE => self.speed = MAX_SPEED_EXIT,
            _ => {}
        }
    }

    fn change_lane<R: Rng>(&mut self, rng: &mut R) {
        self.speed += fudge(MAX_LANE_CHANGE_SPEED_DELTA, rng);
        self.lane = rng.random_range(ENTRANCE_LANE + 1..EXIT_LANE);
    }

    /// Halt the car as part of an accident
    pub fn stop_car(&mut self) {
        self.speed = 0;
        self.last_speed = 0;
        self.is_accident_car = true;
        self.has_been_in_accident = true;
        debug!(
            "car {} stopping at time {} and position {}",
            self.id.0, self.time, self.position
        );
    }

    /// Let a halted car drive again after its accident clears
    pub fn start_car(&mut self) {
        self.is_accident_car = false;
        self.target = None;
        debug!("car {} starting at time {}", self.id.0, self.time);
    }

    /// Snap onto another car's lane and position
    pub fn target_stopped_car(&mut self, lane: u8, position: OrderedFloat<f64>) {
        self.lane = lane;
        self.position = position;
    }

    /// Drive towards the given coordinates on later ticks, then halt there
    ///
    /// An alternative to `target_stopped_car` for bringing the second car of
    /// an accident alongside the first.
    pub fn pursue(&mut self, lane: u8, position: OrderedFloat<f64>) {
        self.target = Some(CarTarget { lane, position });
    }

    fn notification(&self, kind: NotificationKind) -> Notification {
        Notification {
            kind,
            time: self.time,
            car_id: self.id,
            speed: self.speed,
            xway: self.route.xway(),
            lane: self.lane,
            direction: self.direction().index(),
            segment: self.segment(),
            position: self.position.into_inner() as i64,
            query_id: None,
            historical_day: None,
        }
    }

    /// Produce this tick's position report, sometimes followed by a query
    pub fn emit<R: Rng>(&self, counters: &EmissionCounters, rng: &mut R) -> Emission {
        let report = self.notification(NotificationKind::PositionReport);
        counters.record(NotificationKind::PositionReport);

        let mut query = None;
        if rng.random_bool(QUERY_PROBABILITY) {
            let roll = rng.random::<f64>();
            if roll < CURRENT_QUERY_SHARE {
                let mut n = self.notification(NotificationKind::CurrentQuery);
                n.query_id = Some(counters.next_query_id());
                query = Some(n);
            } else if roll < CURRENT_QUERY_SHARE + HISTORICAL_QUERY_SHARE {
                let mut n = self.notification(NotificationKind::HistoricalQuery);
                n.query_id = Some(counters.next_query_id());
                n.historical_day = Some(historical_day(rng));
                query = Some(n);
            }
        }
        if let Some(q) = &query {
            counters.record(q.kind);
        }

        Emission { report, query }
    }
}

/// Random offset in `(-bound, bound)`, equally likely up or down
fn fudge<R: Rng>(bound: i32, rng: &mut R) -> i32 {
    let amount = rng.random_range(0..bound);
    if rng.random_bool(0.5) {
        amount
    } else {
        -amount
    }
}

pub fn historical_day<R: Rng>(rng: &mut R) -> u32 {
    rng.random_range(HISTORICAL_DAY_FIRST..=HISTORICAL_DAY_LAST)
}
