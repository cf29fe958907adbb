//! Core config, errors, and media types for Parlance.

pub mod config;
pub mod error;
pub mod types;
