//! Head-to-head match harness for the Schnapsen engines.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod tournament;
