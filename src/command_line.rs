//! Command lines for PhpSpec runs.

use std::path::Path;

/// Arguments passed to PhpSpec itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentsAndOptionsBuilder;

impl ArgumentsAndOptionsBuilder {
    /// `run --config <path> --no-ansi --format=tap --stop-on-failure`, then any extra
    /// options split on whitespace.
    pub fn build(&self, config_path: &Path, extra_options: &str) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--config".to_string(),
            config_path.display().to_string(),
            "--no-ansi".to_string(),
            "--format=tap".to_string(),
            "--stop-on-failure".to_string(),
        ];
        args.extend(extra_options.split_whitespace().map(str::to_string));
        args
    }
}

/// Combines the PhpSpec executable, the PHP interpreter and the framework arguments.
#[derive(Debug, Clone)]
pub struct CommandLineBuilder {
    php_binary: String,
}

impl CommandLineBuilder {
    pub fn new(php_binary: impl Into<String>) -> Self {
        Self {
            php_binary: php_binary.into(),
        }
    }

    /// A `.phar` executable, or any PHP arguments, means going through the interpreter:
    /// `php <php_extra_args> <executable> <framework_args>`.
    pub fn build(
        &self,
        executable: &str,
        php_extra_args: &[String],
        framework_args: &[String],
    ) -> Vec<String> {
        let mut command_line = Vec::with_capacity(php_extra_args.len() + framework_args.len() + 2);

        if !php_extra_args.is_empty() || executable.ends_with(".phar") {
            command_line.push(self.php_binary.clone());
            command_line.extend(php_extra_args.iter().cloned());
        }

        command_line.push(executable.to_string());
        command_line.extend(framework_args.iter().cloned());
        command_line
    }
}

impl Default for CommandLineBuilder {
    fn default() -> Self {
        Self::new("php")
    }
}
