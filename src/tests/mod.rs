//! Crate-level test modules.
//!
//! Component tests live next to their code; the modules here cover the layers
//! that tie components together:
//! - configuration loading and validation
//! - error conversion and reporting
//! - the table registry under concurrent sessions
//! - the simulation driver

pub mod registry_tests;

pub use test_utils::{key_strategy, small_placement_config, TestFixture};
