//! Database operations for trifold-ui

pub mod settings;
