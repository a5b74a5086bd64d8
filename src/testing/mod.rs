//! Testing utilities and mock implementations
//!
//! Lets the relay loop run against scripted review responses and an
//! in-memory chat instead of the real HTTP services.

pub mod mocks;

pub use mocks::*;
