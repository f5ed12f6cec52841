#![warn(clippy::all, missing_docs)]

//! Core logic for MiniMOTD server-list responses.
//!
//! This crate turns a configuration snapshot and the live player counts
//! into the description text, icon and player numbers shown in a client's
//! server list. It also hosts the reloadable config and icon stores and
//! the file watcher that keeps them current.

pub mod compose;
pub mod config;
pub mod error;
pub mod greeting;
pub mod icon;
pub mod players;
pub mod store;
pub mod watch;

pub use compose::{ComposedResponse, ResponseComposer};
pub use config::{Greeting, MotdSettings};
pub use error::MotdError;
pub use icon::{IconData, IconResolver, IconStore};
pub use players::FakePlayersRule;
pub use store::{ConfigSnapshot, ConfigStore};
pub use watch::{ConfigWatcher, ReloadEvent};
