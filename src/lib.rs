//! Linear Road Data Generator Library
//!
//! Simulates cars driving on a set of expressways and emits the position
//! reports, queries and historical tolls of the Linear Road benchmark.

pub mod simulation;
