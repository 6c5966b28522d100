//! TileMirror - keep a local mirror of remotely hosted data tiles in sync.
//!
//! The library reconciles a catalogue of tile identifiers against a local
//! mirror directory and an authoritative HTTP source, fetches anything that
//! is missing or stale with a fixed pool of workers, and records the outcome
//! of every tile in a JSON manifest.
//!
//! # Architecture
//!
//! ```text
//! catalog ──► distributor (task channel) ──► worker × N
//!                                              │
//!                                              ├── probe      (local + remote state)
//!                                              ├── reconcile  (download / copy / skip)
//!                                              └── transfer   (HTTP fetch or local copy)
//!                                              │
//!             distributor (result channel) ◄───┘
//!                      │
//!                      └──► manifest (timestamped + latest snapshot)
//! ```
//!
//! [`job::MirrorJob`] wires the pieces together for a single run.

pub mod config;
pub mod distributor;
pub mod job;
pub mod logging;
pub mod manifest;
pub mod probe;
pub mod reconcile;
pub mod remote;
pub mod tile;
pub mod transfer;

/// Version of the library, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
