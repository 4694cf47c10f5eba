//! End-to-end operations
//!
//! Each operation wires the core modules together for one command-line run.

pub mod build;
