//! Regression test parameters and operations

use crate::error::TestError;
use camellia_core::{Image, Pixel};
use std::fmt::Debug;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Check results, report failures only (default)
    #[default]
    Compare,
    /// Check results and print intermediate values
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and recorded failures. Every
/// comparison increments the index, so a failure message points at the
/// check that produced it.
pub struct RegParams {
    /// Name of the test (e.g., "label")
    pub test_name: String,
    /// Current test index (incremented before each check)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Recorded failures
    failures: Vec<TestError>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "label")
    ///
    /// The mode comes from the `REGTEST_MODE` environment variable.
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, error: TestError) -> bool {
        eprintln!("Failure in {}_reg: {}", self.test_name, error);
        self.failures.push(error);
        false
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        if self.display() {
            eprintln!("  [{}] expected {expected}, actual {actual}", self.index);
        }
        if (expected - actual).abs() > delta {
            let index = self.index;
            return self.fail(TestError::ValueMismatch {
                index,
                expected,
                actual,
                delta,
            });
        }
        true
    }

    /// Compare two sequences element by element
    ///
    /// # Returns
    ///
    /// `true` if both have the same length and elements, `false` otherwise.
    pub fn compare_slices<T: PartialEq + Debug>(&mut self, expected: &[T], actual: &[T]) -> bool {
        self.index += 1;
        let position = expected
            .iter()
            .zip(actual)
            .position(|(e, a)| e != a)
            .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())));
        match position {
            Some(position) => {
                if self.display() {
                    eprintln!(
                        "  [{}] expected {:?}, actual {:?}",
                        self.index,
                        expected.get(position),
                        actual.get(position)
                    );
                }
                let index = self.index;
                self.fail(TestError::SequenceMismatch { index, position })
            }
            None => true,
        }
    }

    /// Compare two images sample by sample
    ///
    /// ROIs and COIs are ignored: the full buffers are compared.
    ///
    /// # Returns
    ///
    /// `true` if images are identical, `false` otherwise.
    pub fn compare_images<T: Pixel>(&mut self, expected: &Image<T>, actual: &Image<T>) -> bool {
        self.index += 1;
        let index = self.index;

        let geometry = |image: &Image<T>| (image.width(), image.height(), image.channels());
        if geometry(expected) != geometry(actual) {
            return self.fail(TestError::ImageDimensionMismatch {
                index,
                expected: geometry(expected),
                actual: geometry(actual),
            });
        }

        let stride = expected.stride().max(1);
        match expected
            .data()
            .iter()
            .zip(actual.data())
            .position(|(e, a)| e != a)
        {
            Some(i) => {
                let channels = expected.channels() as usize;
                let (x, y) = ((i % stride / channels) as u32, (i / stride) as u32);
                self.fail(TestError::ImageMismatch { index, x, y })
            }
            None => true,
        }
    }

    /// Record a boolean check
    ///
    /// # Arguments
    ///
    /// * `condition` - The checked property
    /// * `what` - Description used in the failure message
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if !condition {
            let index = self.index;
            return self.fail(TestError::CheckFailed {
                index,
                what: what.to_string(),
            });
        }
        true
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all checks passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        let success = self.failures.is_empty();
        if success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();
        success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Get list of failures
    pub fn failures(&self) -> &[TestError] {
        &self.failures
    }
}
