//! Position reports and query records
//!
//! Every car report is one comma separated line with fifteen fields:
//! `kind,time,carId,speed,xway,lane,dir,seg,pos,queryId,-1,-1,-1,-1,day`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{CarId, XWayId};

/// Chance that a report carries an extra query record
pub const QUERY_PROBABILITY: f64 = 0.01;

/// Within a query roll, `[0, 0.5)` is a current query
pub const CURRENT_QUERY_SHARE: f64 = 0.5;

/// Within a query roll, `[0.5, 0.6)` is a historical query; the rest emits nothing
pub const HISTORICAL_QUERY_SHARE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    PositionReport,
    CurrentQuery,
    HistoricalQuery,
}

impl NotificationKind {
    pub fn code(self) -> u8 {
        match self {
            NotificationKind::PositionReport => 0,
            NotificationKind::CurrentQuery => 2,
            NotificationKind::HistoricalQuery => 3,
        }
    }
}

/// One emitted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub time: u32,
    pub car_id: CarId,
    pub speed: i32,
    pub xway: XWayId,
    pub lane: u8,
    pub direction: usize,
    pub segment: usize,
    pub position: i64,
    pub query_id: Option<u64>,
    pub historical_day: Option<u32>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query_id = self.query_id.map_or(-1, |q| q as i64);
        let day = self.historical_day.map_or(-1, i64::from);
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{},-1,-1,-1,-1,{}",
            self.kind.code(),
            self.time,
            self.car_id.0,
            self.speed,
            self.xway.0,
            self.lane,
            self.direction,
            self.segment,
            self.position,
            query_id,
            day
        )
    }
}

/// The records one car produced on one reporting tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub report: Notification,
    pub query: Option<Notification>,
}

impl Emission {
    /// Day of a historical query, if one was emitted
    pub fn historical_day(&self) -> Option<u32> {
        self.query
            .as_ref()
            .filter(|q| q.kind == NotificationKind::HistoricalQuery)
            .and_then(|q| q.historical_day)
    }

    /// Append every record as a newline terminated line
    pub fn write_lines(&self, out: &mut String) {
        use std::fmt::Write;
        for notification in std::iter::once(&self.report).chain(self.query.as_ref()) {
            // Writing into a String cannot fail
            let _ = writeln!(out, "{}", notification);
        }
    }
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmissionTotals {
    pub queries: u64,
    pub position_reports: u64,
    pub current_queries: u64,
    pub historical_queries: u64,
    pub total: u64,
}

/// Run-wide counters shared by every worker
///
/// Query ids come from here so they stay unique and increasing across
/// expressways.
#[derive(Debug, Default)]
pub struct EmissionCounters {
    next_query_id: AtomicU64,
    position_reports: AtomicU64,
    current_queries: AtomicU64,
    historical_queries: AtomicU64,
    total: AtomicU64,
}

impl EmissionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_query_id(&self) -> u64 {
        self.next_query_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn record(&self, kind: NotificationKind) {
        let counter = match kind {
            NotificationKind::PositionReport => &self.position_reports,
            NotificationKind::CurrentQuery => &self.current_queries,
            NotificationKind::HistoricalQuery => &self.historical_queries,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn totals(&self) -> EmissionTotals {
        EmissionTotals {
            queries: self.next_query_id.load(Ordering::Relaxed),
            position_reports: self.position_reports.load(Ordering::Relaxed),
            current_queries: self.current_queries.load(Ordering::Relaxed),
            historical_queries: self.historical_queries.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}
