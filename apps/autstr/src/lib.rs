//! # autstr
//!
//! Command-line and HTTP front ends for the autstr-core engine.

pub mod api;
pub mod cli;
pub mod config;
