// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod context;
pub mod joiner;
pub mod listener;
pub mod worker;
