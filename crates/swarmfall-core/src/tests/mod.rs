//! Test module for determinism and integration tests.
//!
//! - **Determinism tests**: same seed and input produce identical runs
//! - **Integration tests**: systems, spawn manager and frame loop together
//! - **Helpers**: the [`helpers::TestRig`] used by unit tests across the crate
//!
//! # Test Structure
//!
//! - `determinism.rs`: Tests that verify deterministic execution
//! - `integration.rs`: End-to-end tests of the frame pipeline
//! - `helpers.rs`: Test setup utilities and factory functions

pub(crate) mod helpers;
mod integration;
