//! Backend worker: owns the async runtime and the generation service.

pub mod commands;
pub mod runtime;
