//! Recipe catalog core: an immutable base dataset merged with locally
//! persisted edits, deletions and custom entries.
//!
//! The library has no UI dependency. [`catalog::Catalog`] owns the state,
//! [`form::FormController`] drives create/edit, and [`view`] projects the
//! working collection into cards for whichever front end binds to it.

pub mod base;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod form;
pub mod id;
pub mod kv;
pub mod model;
pub mod normalize;
pub mod share;
pub mod store;
pub mod telemetry;
pub mod theme;
pub mod update;
pub mod view;
