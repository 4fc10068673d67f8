//! Per-mutant values exchanged with the mutation-testing host.
//!
//! This module provides:
//! - The immutable context describing one mutant run
//! - Run outcomes and the summary reported back to the host
//! - Process execution for the PhpSpec binary (see [`executor`])

pub mod executor;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// A test known to cover the mutated code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestLocation {
    /// Spec method, e.g. `Acme\CalculatorSpec::it_adds_numbers`
    pub method: String,
    pub file_path: Option<PathBuf>,
    /// Execution time in seconds recorded by the initial run
    pub execution_time: Option<f64>,
}

/// Everything needed to build one mutant run.
///
/// Created fresh per mutant and consumed by a single configuration build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationContext {
    /// Source file that the mutant replaces
    pub original_path: PathBuf,
    /// Mutated copy of `original_path`
    pub mutated_path: PathBuf,
    /// Identifier of the mutant, used to name generated files
    pub hash: String,
    /// Tests covering the mutated code. PhpSpec cannot filter by test, so these are
    /// informational.
    pub tests: Vec<TestLocation>,
    /// PhpSpec version of the run this mutant belongs to
    pub version: String,
}

/// SHA-256 of a mutant's contents, hex encoded.
pub fn content_hash(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:x}", hasher.finalize())
}

/// Result of running the tests against a mutant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// A test failed - mutation was caught
    Killed,
    /// All tests passed - mutation was NOT caught
    Survived,
    /// Tests took too long
    Timeout,
}

impl TestOutcome {
    /// Outcome of a completed run, given whether its TAP output was a pass.
    pub fn from_tests_pass(passed: bool) -> Self {
        if passed {
            Self::Survived
        } else {
            Self::Killed
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Killed => write!(f, "killed"),
            Self::Survived => write!(f, "survived"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Summary of one PhpSpec execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Path of the PhpSpec configuration used
    pub config_path: PathBuf,
    pub command_line: Vec<String>,
    /// Whether the TAP output was classified as a pass
    pub tests_pass: bool,
    pub outcome: TestOutcome,
    pub exit_code: Option<i32>,
    /// Captured output (may be truncated)
    pub output: Option<String>,
    pub execution_time_ms: u64,
}
