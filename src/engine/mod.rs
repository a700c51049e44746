//! Check execution engine.
//!
//! Registration, sequential group scheduling with deadline and interrupt
//! handling, and result recording/aggregation.

pub mod check;
pub mod group;
pub mod interrupt;
pub mod recorder;
pub mod registry;
pub mod runner;
pub mod summary;
