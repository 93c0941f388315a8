//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `dev-compose` command-line tool.
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and
//!   options, derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `dev_compose` library for the core
//!   work.

pub mod assemble;
