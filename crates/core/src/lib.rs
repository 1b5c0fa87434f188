//! Pure types and logic for the briefing orchestrator.
//!
//! This crate contains no async runtime or network dependencies: service
//! mode and job registry types, the worker flag builder, the durable
//! `KEY=value` configuration file, and output artifact discovery. Anything
//! that spawns a process or opens a socket lives in `briefctl-embed` or
//! `briefctl-runner`.

pub mod envfile;
pub mod error;
pub mod flags;
pub mod outputs;
pub mod types;
