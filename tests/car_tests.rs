//! Car kinematics tests
//!
//! Cars are driven directly against a one-expressway grid, without a world.

use linear_road::simulation::{
    CarId, CarUpdateResult, Direction, EmissionCounters, ReentrySchedule, Route, SimCar,
    TrafficGrid, XWayId, ENTRANCE_LANE, EXIT_LANE, FEET_PER_SEGMENT, MAX_POSITION, MAX_SPEED,
    MAX_SPEED_EXIT, REENTRY_DELAY_MAX, REENTRY_DELAY_MIN,
};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn east_route(entrance: usize, rng: &mut StdRng) -> Route {
    Route::new(entrance, Direction::East, XWayId(0), rng)
}

#[test]
fn test_segment_beginning_positions() {
    assert_eq!(SimCar::seg_to_beginning_position(0, Direction::East), 0.0);
    assert_eq!(
        SimCar::seg_to_beginning_position(0, Direction::West),
        (FEET_PER_SEGMENT - 1) as f64
    );
    assert_eq!(
        SimCar::seg_to_beginning_position(10, Direction::East),
        (10 * FEET_PER_SEGMENT) as f64
    );
}

#[test]
fn test_position_to_segment() {
    let boundary = (FEET_PER_SEGMENT * 33) as f64;
    assert_eq!(SimCar::segment_for_position(boundary + 55.0), 33);
    assert_eq!(SimCar::segment_for_position(boundary - 55.0), 32);
    assert_eq!(SimCar::segment_for_position(boundary), 33);
    assert_eq!(SimCar::segment_for_position(MAX_POSITION), 99);
}

#[test]
fn test_distance_from_average_speed() {
    let mut rng = StdRng::seed_from_u64(1);
    let car = SimCar::new(CarId(0), east_route(0, &mut rng), 0);

    // A new car starts at 10 mph with a last speed of 0
    assert_eq!(car.speed, 10);
    assert_eq!(car.last_speed, 0);
    assert!((car.distance_traveled(30) - 220.0).abs() < 1e-6);
    assert!((SimCar::mph_to_feet_per_sec(5.0) - 7.333_333).abs() < 1e-5);
}

#[test]
fn test_new_car_starts_on_entrance_ramp() {
    let mut rng = StdRng::seed_from_u64(2);
    let route = Route::new(20, Direction::West, XWayId(0), &mut rng);
    let car = SimCar::new(CarId(9), route, 50);

    assert_eq!(car.lane, ENTRANCE_LANE);
    assert_eq!(car.segment(), 20);
    assert_eq!(
        car.position.into_inner(),
        SimCar::seg_to_beginning_position(20, Direction::West)
    );
    assert!(car.is_report_due());
    assert!(!car.is_removable());
    assert!(!car.has_been_in_accident());
}

#[test]
fn test_congestion_penalty_steps() {
    assert_eq!(SimCar::congestion_penalty(0), 0);
    assert_eq!(SimCar::congestion_penalty(72), 0);
    assert_eq!(SimCar::congestion_penalty(73), 10);
    assert_eq!(SimCar::congestion_penalty(87), 10);
    assert_eq!(SimCar::congestion_penalty(88), 20);
    assert_eq!(SimCar::congestion_penalty(103), 30);
    assert_eq!(SimCar::congestion_penalty(118), 40);
    assert_eq!(SimCar::congestion_penalty(133), 50);
    assert_eq!(SimCar::congestion_penalty(1000), 50);
}

#[test]
fn test_car_drives_to_exit_and_leaves_its_cell() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut grid = TrafficGrid::new(1);
    let reentrants = ReentrySchedule::new();

    let route = east_route(96, &mut rng);
    let mut car = SimCar::new(CarId(1), route, 0);
    car.enter(&mut grid.view_mut());
    assert_eq!(grid.cells_containing(car.id), vec![car.cell_key()]);

    let mut exit = None;
    for _ in 0..5000 {
        let result = car
            .move_car(&mut grid.view_mut(), &reentrants, &mut rng)
            .expect("move should succeed");
        let position = car.position.into_inner();
        assert!((0.0..=MAX_POSITION).contains(&position));
        car.update_time(1);

        if let CarUpdateResult::Exited { reentry_at } = result {
            exit = Some(reentry_at);
            break;
        }
        assert_eq!(grid.cells_containing(car.id), vec![car.cell_key()]);
    }

    let reentry_at = exit.expect("car should reach its exit");
    assert!(car.is_removable());
    assert_eq!(car.lane, EXIT_LANE);
    assert_eq!(car.speed, MAX_SPEED_EXIT);
    assert_eq!(car.segment(), route.exit_segment());
    assert!(grid.cells_containing(car.id).is_empty());

    let scheduled = reentrants.len().expect("schedule lock");
    match reentry_at {
        Some(at) => {
            assert_eq!(scheduled, 1);
            let delay = at - (car.time - 1);
            assert!((REENTRY_DELAY_MIN..REENTRY_DELAY_MAX).contains(&delay));
        }
        None => assert_eq!(scheduled, 0),
    }
}

#[test]
fn test_position_stays_on_the_road() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut grid = TrafficGrid::new(1);
    let reentrants = ReentrySchedule::new();

    let route = Route::new(3, Direction::West, XWayId(0), &mut rng);
    let mut car = SimCar::new(CarId(2), route, 0);
    car.enter(&mut grid.view_mut());

    for _ in 0..3000 {
        car.move_car(&mut grid.view_mut(), &reentrants, &mut rng)
            .expect("move should succeed");
        let position = car.position.into_inner();
        assert!((0.0..=MAX_POSITION).contains(&position));
        if car.is_removable() {
            break;
        }
    }
    assert!(car.is_removable());
}

#[test]
fn test_halted_car_does_not_move() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut grid = TrafficGrid::new(1);
    let reentrants = ReentrySchedule::new();

    let mut car = SimCar::new(CarId(3), east_route(10, &mut rng), 0);
    car.enter(&mut grid.view_mut());
    car.stop_car();
    let position = car.position;

    for _ in 0..10 {
        car.move_car(&mut grid.view_mut(), &reentrants, &mut rng)
            .expect("move should succeed");
    }
    assert_eq!(car.position, position);
    assert_eq!(car.speed, 0);
    assert!(car.is_accident_car());
}

#[test]
fn test_restart_keeps_accident_history() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut car = SimCar::new(CarId(4), east_route(10, &mut rng), 0);

    car.stop_car();
    assert!(car.is_accident_car());
    assert!(car.has_been_in_accident());

    car.start_car();
    assert!(!car.is_accident_car());
    assert!(car.has_been_in_accident());

    car.re_enter(east_route(40, &mut rng), 1500);
    assert!(!car.is_accident_car());
    assert!(car.has_been_in_accident());
    assert_eq!(car.id, CarId(4));
    assert_eq!(car.lane, ENTRANCE_LANE);
    assert_eq!(car.start_time, 1500);
    assert_eq!(car.segment(), 40);
}

#[test]
fn test_pursuing_car_halts_at_target() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut grid = TrafficGrid::new(1);
    let reentrants = ReentrySchedule::new();

    let mut car = SimCar::new(CarId(5), east_route(0, &mut rng), 0);
    car.enter(&mut grid.view_mut());
    car.pursue(2, OrderedFloat(100.0));

    // 10 -> 100 mph averages 55 mph, about 80.7 feet in the first second
    car.move_car(&mut grid.view_mut(), &reentrants, &mut rng)
        .expect("move should succeed");
    assert_eq!(car.lane, 2);
    assert_eq!(car.speed, MAX_SPEED);
    assert!(car.position.into_inner() > 80.0 && car.position.into_inner() < 100.0);
    assert!(!car.is_accident_car());

    car.move_car(&mut grid.view_mut(), &reentrants, &mut rng)
        .expect("move should succeed");
    assert_eq!(car.position.into_inner(), 100.0);
    assert!(car.is_accident_car());
    assert_eq!(car.speed, 0);
    assert_eq!(grid.cells_containing(car.id), vec![car.cell_key()]);

    car.start_car();
    assert!(car.target().is_none());
}

#[test]
fn test_westbound_car_on_last_segment_starts_on_the_road() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut grid = TrafficGrid::new(1);
    let reentrants = ReentrySchedule::new();
    let counters = EmissionCounters::new();

    let route = Route::new(99, Direction::West, XWayId(0), &mut rng);
    let mut car = SimCar::new(CarId(6), route, 0);
    car.enter(&mut grid.view_mut());
    assert_eq!(car.position.into_inner(), MAX_POSITION);
    assert_eq!(car.segment(), 99);

    let report = car.emit(&counters, &mut rng).report;
    assert_eq!(report.position, MAX_POSITION as i64);
    assert_eq!(report.segment, 99);

    // The first second covers only the average of 10 and 0 mph
    let expected = car.distance_traveled(1);
    car.move_car(&mut grid.view_mut(), &reentrants, &mut rng)
        .expect("move should succeed");
    let moved = MAX_POSITION - car.position.into_inner();
    assert!((moved - expected).abs() < 1e-9, "moved {} feet", moved);
    assert_eq!(grid.cells_containing(car.id), vec![car.cell_key()]);
}
