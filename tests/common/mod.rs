//! Common test utilities for tmc-core integration tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod ui;

#[allow(unused_imports)]
pub use fixtures::*;
pub use ui::*;
