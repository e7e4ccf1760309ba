//! Library half of the `pcb-core` binary: configuration and pipeline
//! wiring live here so integration tests can drive them without going
//! through `clap`/`main`.

pub mod config;
pub mod pipeline;
