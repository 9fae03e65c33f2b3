// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library half of the `cinemad` package: everything `main.rs` wires
//! together, exposed so integration tests can drive a real server instance
//! without going through the process entry point.

pub mod bootstrap;
pub mod config;
pub mod daemon;
pub mod server;
