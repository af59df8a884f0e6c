//! Historical toll derivation
//!
//! Historical queries seen during the run pin the expressway a car used on a
//! given day; the toll file falls back to a random expressway otherwise.

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use super::types::{CarId, XWayId, HISTORICAL_DAY_FIRST, HISTORICAL_DAY_LAST, TOLL_MAX, TOLL_MIN};

/// (car, day) -> expressway, filled by every worker
#[derive(Debug, Default)]
pub struct TollLookup {
    entries: Mutex<HashMap<(CarId, u32), XWayId>>,
}

impl TollLookup {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<(CarId, u32), XWayId>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("toll lookup lock poisoned"))
    }

    pub fn record(&self, car_id: CarId, day: u32, xway: XWayId) -> Result<()> {
        self.lock()?.insert((car_id, day), xway);
        Ok(())
    }

    pub fn record_all<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = ((CarId, u32), XWayId)>,
    {
        let mut map = self.lock()?;
        map.extend(entries);
        Ok(())
    }

    pub fn get(&self, car_id: CarId, day: u32) -> Result<Option<XWayId>> {
        Ok(self.lock()?.get(&(car_id, day)).copied())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// One line of the toll file: `carId,day,xway,toll`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TollRecord {
    pub car_id: CarId,
    pub day: u32,
    pub xway: XWayId,
    pub toll: u32,
}

impl fmt::Display for TollRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.car_id.0, self.day, self.xway.0, self.toll)
    }
}

/// Write one toll record per car id in `0..num_cars` and per historical day
///
/// Returns the number of records written.
pub fn write_toll_file<W: Write, R: Rng>(
    out: &mut W,
    num_cars: u32,
    num_xways: usize,
    lookup: &TollLookup,
    rng: &mut R,
) -> Result<u64> {
    let entries = lookup.lock()?;
    let mut written = 0;
    for car in 0..num_cars {
        let car_id = CarId(car);
        for day in HISTORICAL_DAY_FIRST..=HISTORICAL_DAY_LAST {
            let toll = rng.random_range(TOLL_MIN..TOLL_MAX);
            let xway = match entries.get(&(car_id, day)) {
                Some(xway) => *xway,
                None => XWayId(rng.random_range(0..num_xways.max(1))),
            };
            let record = TollRecord {
                car_id,
                day,
                xway,
                toll,
            };
            writeln!(out, "{}", record).context("Failed to write toll record")?;
            written += 1;
        }
    }
    out.flush().context("Failed to flush toll file")?;
    Ok(written)
}
