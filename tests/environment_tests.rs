//! Occupancy grid, reentry schedule and record format tests

use linear_road::simulation::{
    CarId, CellKey, Direction, Emission, EmissionCounters, Environment, Notification,
    NotificationKind, ReentrySchedule, Route, SimCar, SimConfig, TrafficCondition, TrafficGrid,
    XWay, XWayId, CELLS_PER_XWAY,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn key(xway: usize, segment: usize, direction: Direction) -> CellKey {
    CellKey::new(XWayId(xway), segment, direction)
}

#[test]
fn test_cell_membership_is_idempotent() {
    let mut cell = TrafficCondition::new(0, key(0, 4, Direction::East));
    cell.add_car(CarId(7));
    cell.add_car(CarId(7));
    cell.add_car(CarId(3));
    assert_eq!(cell.num_cars(), 2);
    assert_eq!(cell.cars().collect::<Vec<_>>(), vec![CarId(3), CarId(7)]);

    assert!(cell.remove_car(CarId(7)));
    assert!(!cell.remove_car(CarId(7)));
    assert!(!cell.contains(CarId(7)));
    assert_eq!(cell.num_cars(), 1);
}

#[test]
fn test_cell_accident_follows_its_xway() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut env = Environment::new(
        SimConfig {
            num_xways: 2,
            ..SimConfig::default()
        },
        &mut rng,
    )
    .expect("environment should build");
    assert_eq!(env.grid.len(), 2 * CELLS_PER_XWAY);

    let cell_key = key(1, 50, Direction::West);
    assert!(!env.has_accident(cell_key));

    let accident = linear_road::simulation::Accident::new(
        CarId(1),
        CarId(2),
        100,
        50,
        Direction::West,
    );
    assert!(env.xways[1].turn_on_accident(accident, 10, &mut rng));
    assert!(!env.xways[1].turn_on_accident(accident, 10, &mut rng));

    // Every cell of the expressway reports it, other expressways do not
    assert!(env.has_accident(cell_key));
    assert!(env.has_accident(key(1, 3, Direction::East)));
    assert!(!env.has_accident(key(0, 50, Direction::West)));
    assert_eq!(env.active_accidents(), 1);

    let xway: &XWay = env.xway(XWayId(1)).expect("xway exists");
    let cell = env.grid.cell(cell_key).expect("cell exists");
    assert!(cell.has_accident(xway));
}

#[test]
fn test_grid_lookups_reject_out_of_range_keys() {
    let mut grid = TrafficGrid::new(1);
    assert!(grid.cell(key(1, 0, Direction::East)).is_none());
    assert!(grid.cell(key(0, 100, Direction::East)).is_none());

    let mut view = grid.view_mut();
    view.add_car(key(3, 0, Direction::East), CarId(1));
    assert_eq!(view.num_cars(key(3, 0, Direction::East)), 0);
    assert_eq!(grid.total_cars(), 0);
}

#[test]
fn test_xway_views_are_disjoint() {
    let mut grid = TrafficGrid::new(2);
    {
        let mut views = grid.xway_views_mut();
        assert_eq!(views.len(), 2);

        // A view only reaches its own expressway
        views[1].add_car(key(0, 5, Direction::East), CarId(1));
        views[1].add_car(key(1, 5, Direction::East), CarId(2));
        views[0].add_car(key(0, 5, Direction::East), CarId(3));
        assert_eq!(views[1].num_cars(key(0, 5, Direction::East)), 0);
        assert_eq!(views[0].num_cars(key(0, 5, Direction::East)), 1);
    }

    assert_eq!(grid.cells_containing(CarId(1)), Vec::<CellKey>::new());
    assert_eq!(grid.cells_containing(CarId(2)), vec![key(1, 5, Direction::East)]);
    assert_eq!(grid.cells_containing(CarId(3)), vec![key(0, 5, Direction::East)]);

    let mut view = grid.view_mut();
    view.transfer_car(key(1, 5, Direction::East), key(1, 6, Direction::East), CarId(2));
    assert_eq!(grid.cells_containing(CarId(2)), vec![key(1, 6, Direction::East)]);
}

#[test]
fn test_reentry_schedule_returns_cars_due_at_exact_tick() {
    let mut rng = StdRng::seed_from_u64(2);
    let schedule = ReentrySchedule::new();
    let route = Route::random(1, &mut rng);

    schedule
        .schedule(1500, SimCar::new(CarId(1), route, 0))
        .expect("schedule lock");
    schedule
        .schedule(1500, SimCar::new(CarId(2), route, 0))
        .expect("schedule lock");
    schedule
        .schedule(1800, SimCar::new(CarId(3), route, 0))
        .expect("schedule lock");

    assert_eq!(schedule.len().expect("schedule lock"), 3);
    assert_eq!(schedule.next_due().expect("schedule lock"), Some(1500));
    assert!(schedule.take_due(1499).expect("schedule lock").is_empty());

    let due = schedule.take_due(1500).expect("schedule lock");
    let ids: Vec<_> = due.iter().map(|car| car.id).collect();
    assert_eq!(ids, vec![CarId(1), CarId(2)]);
    assert_eq!(schedule.next_due().expect("schedule lock"), Some(1800));
    assert!(!schedule.is_empty().expect("schedule lock"));
}

#[test]
fn test_record_lines_match_wire_format() {
    let report = Notification {
        kind: NotificationKind::PositionReport,
        time: 30,
        car_id: CarId(12),
        speed: 55,
        xway: XWayId(1),
        lane: 2,
        direction: 1,
        segment: 40,
        position: 214_000,
        query_id: None,
        historical_day: None,
    };
    assert_eq!(
        report.to_string(),
        "0,30,12,55,1,2,1,40,214000,-1,-1,-1,-1,-1,-1"
    );

    let query = Notification {
        kind: NotificationKind::HistoricalQuery,
        query_id: Some(4),
        historical_day: Some(17),
        ..report.clone()
    };
    let emission = Emission {
        report,
        query: Some(query),
    };
    assert_eq!(emission.historical_day(), Some(17));

    let mut lines = String::new();
    emission.write_lines(&mut lines);
    assert_eq!(
        lines,
        "0,30,12,55,1,2,1,40,214000,-1,-1,-1,-1,-1,-1\n3,30,12,55,1,2,1,40,214000,4,-1,-1,-1,-1,17\n"
    );
}

#[test]
fn test_emission_counters_track_every_record() {
    let mut rng = StdRng::seed_from_u64(8);
    let counters = EmissionCounters::new();
    let car = SimCar::new(CarId(0), Route::random(1, &mut rng), 0);

    let mut query_ids = Vec::new();
    for _ in 0..20_000 {
        let emission = car.emit(&counters, &mut rng);
        assert_eq!(emission.report.kind, NotificationKind::PositionReport);
        if let Some(query) = emission.query {
            assert_ne!(query.kind, NotificationKind::PositionReport);
            query_ids.push(query.query_id.expect("queries carry an id"));
        }
    }

    let totals = counters.totals();
    assert_eq!(totals.position_reports, 20_000);
    assert_eq!(totals.queries, query_ids.len() as u64);
    assert!(query_ids.windows(2).all(|w| w[0] < w[1]));
    assert!(totals.current_queries > totals.historical_queries);
    assert_eq!(
        totals.total,
        totals.position_reports + totals.current_queries + totals.historical_queries
    );
}
