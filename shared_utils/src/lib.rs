//! Small helpers shared by the workspace crates: environment access and
//! config-file loading with typed errors.

pub mod config;
pub mod env;
