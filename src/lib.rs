//! Feedback and team health analytics for PeerPulse.
//!
//! The core modules (`sentiment`, `themes`, `metrics`, `report`) are pure functions over
//! already-fetched records. `db` and `config` belong to the surrounding application.

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;
pub mod sentiment;
pub mod themes;
