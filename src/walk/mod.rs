//! Directory tree walking.
//!
//! One traversal algorithm, two execution modes:
//!
//! - [`Walk`] / [`WalkWithInfo`]: blocking iterators
//! - [`AsyncWalk`] / [`AsyncWalkWithInfo`]: suspending walkers pumped with
//!   `next_entry().await`
//!
//! Both modes classify entries the same way (including symlinks to
//! directories, files, and dangling targets), share one filter pipeline,
//! and yield identical entry sets for identical inputs.

mod async_walker;
mod config;
mod entry;
mod filter;
mod walker;

pub use async_walker::{AsyncWalk, AsyncWalkWithInfo};
pub use config::{OnPermissionDenied, WalkConfig};
pub use entry::{EntryInfo, WalkEntry, WalkEntryExtra, WalkEntryKind};
pub use walker::{Walk, WalkWithInfo};
