//! Personal task tracker: flat tasks, epics and epic-owned subtasks.
//!
//! The [`registry`] module is the consistency engine: entity maps, derived
//! epic state, schedule conflict rejection, the time-ordered view and a
//! bounded recency history. [`store`] persists whole-graph snapshots and
//! [`api`] exposes the registry over HTTP.

pub mod api;
pub mod error;
pub mod models;
pub mod registry;
pub mod store;
