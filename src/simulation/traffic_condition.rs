//! Segment/direction occupancy tracking
//!
//! Every (expressway, segment, direction) triple owns one `TrafficCondition`
//! cell holding the ids of the cars currently inside it. Cells live in a flat
//! arena; cars only ever store their own coordinates and look cells up by key.

use sorted_vec::SortedSet;

use super::types::{CarId, CellKey, Direction, XWayId, NUM_SEGMENTS};
use super::xway::XWay;

/// Number of cells owned by one expressway
pub const CELLS_PER_XWAY: usize = NUM_SEGMENTS * 2;

/// Occupancy of a single segment in one direction
#[derive(Debug, Clone)]
pub struct TrafficCondition {
    pub id: usize,
    pub key: CellKey,
    cars: SortedSet<CarId>,
}

impl TrafficCondition {
    pub fn new(id: usize, key: CellKey) -> Self {
        Self {
            id,
            key,
            cars: SortedSet::new(),
        }
    }

    /// Add a car; adding a member again is a no-op
    pub fn add_car(&mut self, car_id: CarId) {
        self.cars.find_or_insert(car_id);
    }

    /// Remove a car, returning whether it was a member
    pub fn remove_car(&mut self, car_id: CarId) -> bool {
        self.cars.remove_item(&car_id).is_some()
    }

    pub fn contains(&self, car_id: CarId) -> bool {
        self.cars.binary_search(&car_id).is_ok()
    }

    pub fn num_cars(&self) -> usize {
        self.cars.len()
    }

    /// Member ids in ascending order
    pub fn cars(&self) -> impl Iterator<Item = CarId> + '_ {
        self.cars.iter().copied()
    }

    /// A cell has no accident state of its own; it reports its expressway's
    pub fn has_accident(&self, xway: &XWay) -> bool {
        xway.id == self.key.xway && xway.has_accident()
    }
}

fn local_index(segment: usize, direction: Direction) -> usize {
    segment * 2 + direction.index()
}

/// The arena of all cells, sized once for the whole run
#[derive(Debug, Clone)]
pub struct TrafficGrid {
    cells: Vec<TrafficCondition>,
    num_xways: usize,
}

impl TrafficGrid {
    pub fn new(num_xways: usize) -> Self {
        let mut cells = Vec::with_capacity(num_xways * CELLS_PER_XWAY);
        for xway in 0..num_xways {
            for segment in 0..NUM_SEGMENTS {
                for direction in Direction::ALL {
                    let id = cells.len();
                    cells.push(TrafficCondition::new(
                        id,
                        CellKey::new(XWayId(xway), segment, direction),
                    ));
                }
            }
        }
        Self { cells, num_xways }
    }

    pub fn num_xways(&self) -> usize {
        self.num_xways
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, key: CellKey) -> Option<usize> {
        if key.xway.0 >= self.num_xways || key.segment >= NUM_SEGMENTS {
            return None;
        }
        Some(key.xway.0 * CELLS_PER_XWAY + local_index(key.segment, key.direction))
    }

    pub fn cell(&self, key: CellKey) -> Option<&TrafficCondition> {
        self.index(key).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, key: CellKey) -> Option<&mut TrafficCondition> {
        let index = self.index(key)?;
        Some(&mut self.cells[index])
    }

    /// Cell query for accidents, answered by the owning expressway
    pub fn has_accident(&self, key: CellKey, xways: &[XWay]) -> bool {
        match (self.cell(key), xways.get(key.xway.0)) {
            (Some(cell), Some(xway)) => cell.has_accident(xway),
            _ => false,
        }
    }

    /// Keys of every cell that lists the car as a member
    pub fn cells_containing(&self, car_id: CarId) -> Vec<CellKey> {
        self.cells
            .iter()
            .filter(|cell| cell.contains(car_id))
            .map(|cell| cell.key)
            .collect()
    }

    pub fn total_cars(&self) -> usize {
        self.cells.iter().map(TrafficCondition::num_cars).sum()
    }

    /// Mutable view over every expressway
    pub fn view_mut(&mut self) -> GridView<'_> {
        GridView {
            first_xway: 0,
            cells: &mut self.cells,
        }
    }

    /// One disjoint view per expressway, for per-expressway workers
    pub fn xway_views_mut(&mut self) -> Vec<GridView<'_>> {
        self.cells
            .chunks_mut(CELLS_PER_XWAY)
            .enumerate()
            .map(|(xway, cells)| GridView {
                first_xway: xway,
                cells,
            })
            .collect()
    }
}

/// A mutable window onto a contiguous run of expressways in the grid
///
/// Lookups outside the window resolve to `None`, so a worker can only touch
/// the cells of the expressways it was handed.
#[derive(Debug)]
pub struct GridView<'a> {
    first_xway: usize,
    cells: &'a mut [TrafficCondition],
}

impl GridView<'_> {
    fn index(&self, key: CellKey) -> Option<usize> {
        if key.segment >= NUM_SEGMENTS {
            return None;
        }
        let xway = key.xway.0.checked_sub(self.first_xway)?;
        let index = xway * CELLS_PER_XWAY + local_index(key.segment, key.direction);
        (index < self.cells.len()).then_some(index)
    }

    pub fn cell(&self, key: CellKey) -> Option<&TrafficCondition> {
        self.index(key).map(|i| &self.cells[i])
    }

    pub fn num_cars(&self, key: CellKey) -> usize {
        self.cell(key).map_or(0, TrafficCondition::num_cars)
    }

    pub fn add_car(&mut self, key: CellKey, car_id: CarId) {
        if let Some(i) = self.index(key) {
            self.cells[i].add_car(car_id);
        }
    }

    pub fn remove_car(&mut self, key: CellKey, car_id: CarId) -> bool {
        match self.index(key) {
            Some(i) => self.cells[i].remove_car(car_id),
            None => false,
        }
    }

    /// Move a car's membership from one cell to another
    pub fn transfer_car(&mut self, from: CellKey, to: CellKey, car_id: CarId) {
        if from == to {
            return;
        }
        self.remove_car(from, car_id);
        self.add_car(to, car_id);
    }
}
