//! camellia-test - Regression test framework for Camellia
//!
//! This crate provides the regression test harness shared by the
//! workspace's `*_reg.rs` integration tests, plus deterministic synthetic
//! images and brute-force reference implementations to check against.
//!
//! Two modes are supported:
//!
//! - **Compare**: Check results and report failures (default)
//! - **Display**: Also print the compared values
//!
//! # Usage
//!
//! ```
//! use camellia_test::{RegParams, filled_disk};
//!
//! let disk = filled_disk(32, 32, 16, 16, 8).unwrap();
//! let area = disk.data().iter().filter(|&&v| v != 0).count();
//!
//! let mut rp = RegParams::new("disk");
//! rp.compare_values(201.0, area as f64, 10.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};
pub use synth::{filled_disk, flood_fill_labels, random_binary, random_levels};
