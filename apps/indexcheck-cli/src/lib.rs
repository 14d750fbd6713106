//! indexcheck CLI library
//!
//! Command implementations and support code for the `indexcheck` binary.

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
