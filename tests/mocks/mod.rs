//! Test doubles for driving the engine without a real target system.


pub use checks::*;
