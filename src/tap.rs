//! Pass/fail classification of PhpSpec's TAP output.
//!
//! Only as much of the Test Anything Protocol as needed to decide whether a run
//! passed: see <https://testanything.org/>.

/// Characters stripped from the start of each line before classification. Sub-tests
/// and YAML diagnostic blocks are indented.
const LEADING_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Decide whether a captured run passed.
///
/// Scans line by line: a `Bail out!` or any `not ok ` line fails the run immediately,
/// `# TODO` directives included. Otherwise the run passes only if at least one
/// `ok ` line was seen, so output from a runner that crashed before reporting
/// anything is a failure.
pub fn tests_pass(output: &str) -> bool {
    let mut saw_pass = false;

    for line in output.lines() {
        let line = line.trim_start_matches(LEADING_WHITESPACE);

        if line.starts_with("Bail out!") || line.starts_with("not ok ") {
            return false;
        }

        if line.starts_with("ok ") {
            saw_pass = true;
        }
    }

    saw_pass
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Basic lines
    // =========================================================================

    #[test]
    fn test_all_ok_lines_pass() {
        assert!(tests_pass("ok 1 - x\nok 2 - y"));
    }

    #[test]
    fn test_single_failure_fails() {
        assert!(!tests_pass("not ok 1 - x"));
    }

    #[test]
    fn test_failure_after_success_fails() {
        assert!(!tests_pass("ok 1 - x\nnot ok 2 - y"));
    }

    #[test]
    fn test_todo_directive_does_not_forgive_failure() {
        assert!(!tests_pass("ok 1 - x\nnot ok 2 - y # TODO"));
        assert!(!tests_pass("ok 1 - x\nnot ok 2 - y # TODO not implemented yet"));
    }

    #[test]
    fn test_skip_directive_on_ok_line_passes() {
        assert!(tests_pass("ok 1 - x # SKIP no database"));
    }

    #[test]
    fn test_bail_out_fails() {
        assert!(!tests_pass("Bail out! reason"));
        assert!(!tests_pass("TAP version 13\nok 1 - x\nBail out! database gone\nok 2 - y"));
    }

    #[test]
    fn test_version_header_alone_fails() {
        assert!(!tests_pass("TAP version 13"));
    }

    #[test]
    fn test_empty_output_fails() {
        assert!(!tests_pass(""));
        assert!(!tests_pass("\n\n"));
    }

    #[test]
    fn test_header_ok_and_plan_pass() {
        assert!(tests_pass("TAP version 13\nok 1 - x\n1..1"));
    }

    #[test]
    fn test_ok_requires_trailing_space() {
        assert!(!tests_pass("okay then"));
        assert!(!tests_pass("ok"));
        // "not ok" without a trailing space is not a result line either
        assert!(tests_pass("ok 1 - x\nnot okay"));
    }

    // =========================================================================
    // Indentation and diagnostics
    // =========================================================================

    #[test]
    fn test_indented_failure_fails() {
        let output = "TAP version 13\nok 1 - x\n    not ok 1 - nested\nok 2 - y\n1..2";
        assert!(!tests_pass(output));
    }

    #[test]
    fn test_indented_ok_counts() {
        assert!(tests_pass("\tok 1 - nested\n"));
    }

    #[test]
    fn test_yaml_diagnostic_block_is_ignored() {
        let output = r#"TAP version 13
ok 1 - Acme\CalculatorSpec: adds numbers
  ---
  message: 'all good'
  severity: comment
  ...
ok 2 - Acme\CalculatorSpec: subtracts numbers
1..2
"#;
        assert!(tests_pass(output));
    }

    #[test]
    fn test_failure_with_yaml_diagnostic_fails() {
        let output = r#"TAP version 13
ok 1 - Acme\CalculatorSpec: adds numbers
not ok 2 - Error: Acme\CalculatorSpec: divides numbers
  ---
  message: 'Division by zero'
  severity: fail
  ...
1..2
"#;
        assert!(!tests_pass(output));
    }

    #[test]
    fn test_windows_line_endings() {
        assert!(tests_pass("TAP version 13\r\nok 1 - x\r\n1..1\r\n"));
        assert!(!tests_pass("ok 1 - x\r\nnot ok 2 - y\r\n"));
    }

    // =========================================================================
    // Runner crashes
    // =========================================================================

    #[test]
    fn test_fatal_error_without_results_fails() {
        let output = r#"TAP version 13

Fatal error: Access level to Foo\Bar\Foobar::foobar() must be public (as in class Foo\Bar\FoobarInterface) in...

Call Stack:
"#;
        assert!(!tests_pass(output));
    }

    #[test]
    fn test_full_passing_run() {
        let output = r#"TAP version 13
ok 1 - Acme\Application\Handler\AddViolationHandler: should add violation
ok 2 - Acme\Infrastructure\InMemoryGoalRepository: should add goal
ok 3 - Acme\Infrastructure\InMemoryGoalRepository: should remove existing one
ok 4 - Acme\Infrastructure\InMemoryGoalRepository: should find by user id
1..4
"#;
        assert!(tests_pass(output));
    }

    #[test]
    fn test_full_failing_run() {
        let output = r#"TAP version 13
not ok 1 - Error: Acme\Infrastructure\InMemoryGoalRepository: should find by user id
ok 2 - Acme\Application\Handler\AddViolationHandler: should add violation
ok 3 - Acme\Infrastructure\InMemoryGoalRepository: should add goal
1..3
"#;
        assert!(!tests_pass(output));
    }
}
