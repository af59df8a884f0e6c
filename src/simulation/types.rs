//! Core types for the linear road simulation
//!
//! Identifiers, cell keys and the fixed world geometry shared by every
//! component.

/// A unique identifier for a car, stable across reentries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarId(pub u32);

/// Expressway index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XWayId(pub usize);

/// Travel direction on an expressway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Segment indices increase along the direction of travel
    East,
    /// Segment indices decrease along the direction of travel
    West,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::East, Direction::West];

    /// Numeric direction as written in reports (0 or 1)
    pub fn index(self) -> usize {
        match self {
            Direction::East => 0,
            Direction::West => 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            Direction::East
        } else {
            Direction::West
        }
    }

    /// Sign applied to distance travelled along the expressway
    pub fn sign(self) -> f64 {
        match self {
            Direction::East => 1.0,
            Direction::West => -1.0,
        }
    }
}

/// Logical coordinates of one traffic condition cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub xway: XWayId,
    pub segment: usize,
    pub direction: Direction,
}

impl CellKey {
    pub fn new(xway: XWayId, segment: usize, direction: Direction) -> Self {
        Self {
            xway,
            segment,
            direction,
        }
    }
}

/// Number of segments per expressway
pub const NUM_SEGMENTS: usize = 100;

/// Segment length in feet (one mile)
pub const FEET_PER_SEGMENT: usize = 5280;

/// Highest legal position in feet
pub const MAX_POSITION: f64 = (FEET_PER_SEGMENT * (NUM_SEGMENTS - 1)) as f64;

/// Downtown spans `[DOWNTOWN_START, DOWNTOWN_END]`, the middle third of the road
pub const DOWNTOWN_START: usize = NUM_SEGMENTS / 3;
pub const DOWNTOWN_END: usize = NUM_SEGMENTS * 2 / 3;

/// Minimum number of segments between entrance and exit
pub const ROUTE_BUFFER: usize = 2;

pub const NUM_LANES: u8 = 5;
pub const ENTRANCE_LANE: u8 = 0;
pub const EXIT_LANE: u8 = NUM_LANES - 1;
pub const NUM_TRAVEL_LANES: usize = (NUM_LANES - 2) as usize;

/// Speeds in mph
pub const MAX_SPEED: i32 = 100;
pub const MAX_SPEED_ENTRANCE: i32 = 40;
pub const ENTRY_SPEED: i32 = 10;
pub const MAX_SPEED_EXIT: i32 = 10;
pub const SPEED_LIMIT: i32 = 70;
pub const SPEED_FUDGE: i32 = 10;
pub const MAX_LANE_CHANGE_SPEED_DELTA: i32 = 5;
pub const ACCELERATION_ENTRANCE: i32 = 10;
pub const ACCELERATION_TRAVEL: i32 = 5;

/// Probability that a car in a travel lane changes lane on a given tick
pub const TRAVEL_LANE_CHANGE_PROBABILITY: f64 = 0.4;

/// Cars per travel lane before congestion starts slowing traffic
pub const FULL_SPEED_CARS_PER_LANE: usize = 24;

/// Extra cars per travel lane that make up one congestion step
pub const CONGESTION_STEP_CARS_PER_LANE: usize = 5;

/// Seconds each car advances per tick
pub const UPDATE_INTERVAL: u32 = 1;

/// Seconds between position reports of one car
pub const TIME_INTERVAL: u32 = 30;

/// Chance that an exiting car comes back later
pub const REENTRANT_PERCENT: f64 = 0.10;

/// Reentry delay range in ticks, `[min, max)`
pub const REENTRY_DELAY_MIN: u32 = 1000;
pub const REENTRY_DELAY_MAX: u32 = 2000;

/// Historical toll days, inclusive on both ends
pub const HISTORICAL_DAY_FIRST: u32 = 1;
pub const HISTORICAL_DAY_LAST: u32 = 69;

/// Toll values are drawn from `[TOLL_MIN, TOLL_MAX)`
pub const TOLL_MIN: u32 = 10;
pub const TOLL_MAX: u32 = 100;

/// A second car must be less than this many feet behind the first one
pub const ACCIDENT_PARTNER_DISTANCE: f64 = 1000.0;

/// Symmetric jitter applied to accident schedules, in minutes
pub const ACCIDENT_JITTER_MINUTES: u32 = 5;

pub fn min_to_sec(minutes: u32) -> u32 {
    minutes * 60
}

/// Whether a lane is one of the travel lanes (neither entrance nor exit)
pub fn is_travel_lane(lane: u8) -> bool {
    lane > ENTRANCE_LANE && lane < EXIT_LANE
}
