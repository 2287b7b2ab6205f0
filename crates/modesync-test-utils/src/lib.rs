//! Shared test fixtures for the modesync workspace.
//!
//! Dev-dependency only. Provides [`ModesFixture`], a temporary directory
//! holding a modes tree plus global and project target locations.

pub mod fixture;

pub use fixture::{ModesFixture, mode_yaml};
