//! Hearth command-line client
//!
//! Thin layer over `hearth-daemon-client`: parses arguments, loads
//! configuration and composes the connector with its default collaborators.

pub mod cli;
pub mod commands;
pub mod config;
