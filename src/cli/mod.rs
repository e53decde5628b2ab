//! CLI infrastructure for the collective learning-dynamics toolkit
//!
//! This module provides the command-line interface for running experiments,
//! describing configured environments and inspecting saved runs.

pub mod commands;
pub mod output;
