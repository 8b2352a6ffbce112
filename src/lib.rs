//! Persistence core of the facette metrics dashboard
//!
//! See [`storage`] for the entity mapping layer and [`config`] for the
//! configuration it is opened from.

pub mod config;
pub mod storage;
pub mod util;
