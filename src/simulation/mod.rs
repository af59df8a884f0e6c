//! Standalone Linear Road traffic generator
//!
//! This module contains the whole simulation: expressway geometry, car
//! kinematics, occupancy cells, accidents, reentry and the emitted record
//! formats. It has no I/O of its own beyond the sinks it is handed.

mod car;
mod car_manager;
mod config;
mod emission;
mod environment;
mod output;
mod route;
mod tolls;
mod traffic_condition;
mod types;
mod world;
mod xway;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use car::{historical_day, CarTarget, CarUpdateResult, SimCar};
#[allow(unused_imports)]
pub use car_manager::{
    advance_cars, check_accidents, create_accident, injection_count, is_within_partner_distance,
    reenter_car, release_accident, spawn_car, TickShared,
};
#[allow(unused_imports)]
pub use config::{
    ExecutionMode, SimConfig, DEFAULT_ACCIDENT_CLEAR_WAIT, DEFAULT_ACCIDENT_INTERVAL,
    DEFAULT_CARS_PER_TICK, DEFAULT_CAR_MULTIPLIER_FACTOR, DEFAULT_SIM_LENGTH,
};
#[allow(unused_imports)]
pub use emission::{
    Emission, EmissionCounters, EmissionTotals, Notification, NotificationKind,
    CURRENT_QUERY_SHARE, HISTORICAL_QUERY_SHARE, QUERY_PROBABILITY,
};
#[allow(unused_imports)]
pub use environment::{Environment, ReentrySchedule};
#[allow(unused_imports)]
pub use output::OutputSink;
#[allow(unused_imports)]
pub use route::{is_before_downtown, is_in_downtown, Route, DOWNTOWN_EXIT_PROBABILITY};
#[allow(unused_imports)]
pub use tolls::{write_toll_file, TollLookup, TollRecord};
#[allow(unused_imports)]
pub use traffic_condition::{GridView, TrafficCondition, TrafficGrid, CELLS_PER_XWAY};
#[allow(unused_imports)]
pub use types::*;
pub use world::{RunReport, SimWorld};
#[allow(unused_imports)]
pub use xway::{jittered_seconds, Accident, XWay};
