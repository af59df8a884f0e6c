//! Route generation
//!
//! A route fixes where a car enters, where it leaves, which way it travels
//! and on which expressway, for one lifetime on the road.

use rand::Rng;

use super::types::{
    Direction, XWayId, DOWNTOWN_END, DOWNTOWN_START, NUM_SEGMENTS, ROUTE_BUFFER,
};

/// Chance that a car passing through downtown exits there instead
pub const DOWNTOWN_EXIT_PROBABILITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    entrance_segment: usize,
    exit_segment: usize,
    direction: Direction,
    xway: XWayId,
}

impl Route {
    /// Build a route for a given entrance, drawing the exit segment
    pub fn new<R: Rng>(
        entrance_segment: usize,
        direction: Direction,
        xway: XWayId,
        rng: &mut R,
    ) -> Self {
        let entrance_segment = entrance_segment.min(NUM_SEGMENTS - 1);
        let exit_segment = Self::draw_exit_segment(entrance_segment, direction, rng);
        Self {
            entrance_segment,
            exit_segment,
            direction,
            xway,
        }
    }

    /// A fresh route with random direction, entrance and expressway
    ///
    /// Entrances leave at least `ROUTE_BUFFER` segments of road ahead of the car.
    pub fn random<R: Rng>(num_xways: usize, rng: &mut R) -> Self {
        let direction = Direction::from_index(rng.random_range(0..2));
        let entrance_segment = match direction {
            Direction::East => rng.random_range(0..NUM_SEGMENTS - ROUTE_BUFFER),
            Direction::West => rng.random_range(ROUTE_BUFFER..NUM_SEGMENTS),
        };
        let xway = XWayId(rng.random_range(0..num_xways.max(1)));
        Self::new(entrance_segment, direction, xway, rng)
    }

    fn draw_exit_segment<R: Rng>(
        entrance: usize,
        direction: Direction,
        rng: &mut R,
    ) -> usize {
        let (low, high) = match direction {
            Direction::East => {
                let low = (entrance + ROUTE_BUFFER).min(NUM_SEGMENTS - 1);
                (low, NUM_SEGMENTS - 1)
            }
            Direction::West => (0, entrance.saturating_sub(ROUTE_BUFFER)),
        };
        let mut exit = rng.random_range(low..=high);

        if is_before_downtown(entrance, direction) && rng.random_bool(DOWNTOWN_EXIT_PROBABILITY) {
            // Keep the buffer even when the entrance sits right next to downtown
            let (low, high) = match direction {
                Direction::East => ((entrance + ROUTE_BUFFER).max(DOWNTOWN_START), DOWNTOWN_END),
                Direction::West => (DOWNTOWN_START, (entrance - ROUTE_BUFFER).min(DOWNTOWN_END)),
            };
            if low <= high {
                exit = rng.random_range(low..=high);
            }
        }

        exit
    }

    pub fn entrance_segment(&self) -> usize {
        self.entrance_segment
    }

    pub fn exit_segment(&self) -> usize {
        self.exit_segment
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn xway(&self) -> XWayId {
        self.xway
    }

    /// The segment a car reaches right after leaving its entrance segment
    pub fn first_travel_segment(&self) -> Option<usize> {
        match self.direction {
            Direction::East => Some(self.entrance_segment + 1).filter(|s| *s < NUM_SEGMENTS),
            Direction::West => self.entrance_segment.checked_sub(1),
        }
    }
}

/// Whether a car entering at `entrance` will pass through downtown
pub fn is_before_downtown(entrance: usize, direction: Direction) -> bool {
    match direction {
        Direction::East => entrance < DOWNTOWN_START,
        Direction::West => entrance > DOWNTOWN_END,
    }
}

pub fn is_in_downtown(segment: usize) -> bool {
    (DOWNTOWN_START..=DOWNTOWN_END).contains(&segment)
}
