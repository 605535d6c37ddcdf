//! Core sitectl library (status protocol, sync controller, config).

pub mod config;
pub mod interrupt;
pub mod logging;
pub mod status;
pub mod sync;
