//! End-to-end tests for the picolang compiler
//!
//! These tests compile picolang source, execute the finalized instruction
//! list, and check the results with and without optimization.

mod harness;
mod expressions;
mod variables;
mod control_flow;
mod functions;
mod errors;
mod assembly;

pub use harness::*;
