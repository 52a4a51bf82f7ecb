// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Utility modules
//!
//! Common utilities for the pipescaffold CLI.

pub mod colors;

pub use colors::*;
