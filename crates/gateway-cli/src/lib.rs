//! Shared plumbing for the gateway binaries.

pub mod args;
pub mod exit;
pub mod register;
pub mod telemetry;
