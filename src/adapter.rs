//! The PhpSpec test framework adapter.
//!
//! Ties together configuration building, command lines, version detection, process
//! execution and TAP classification behind the operations a mutation-testing host
//! calls.

use crate::command_line::{ArgumentsAndOptionsBuilder, CommandLineBuilder};
use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::mutation::executor::{truncate_output, ProcessRunner};
use crate::mutation::{MutationContext, RunResult, TestOutcome};
use crate::phpspec::autoload::{Interceptor, MutationAutoloadTemplate};
use crate::phpspec::builder::{
    FileWriter, FsFileWriter, InitialConfigBuilder, MutationConfigBuilder,
};
use crate::phpspec::document::ConfigDocument;
use crate::phpspec::rewriter::{CoverageExtensionMatcher, NameContains};
use crate::tap;
use crate::version::{CachedVersionProvider, ProcessVersionProvider, VersionProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub struct PhpSpecAdapter<R, V> {
    executable: String,
    initial_config_builder: InitialConfigBuilder,
    mutation_config_builder: MutationConfigBuilder,
    arguments_builder: ArgumentsAndOptionsBuilder,
    command_line_builder: CommandLineBuilder,
    version_provider: V,
    runner: R,
    max_output_bytes: usize,
}

impl<R: ProcessRunner, V: VersionProvider> PhpSpecAdapter<R, V> {
    pub fn new(
        executable: impl Into<String>,
        initial_config_builder: InitialConfigBuilder,
        mutation_config_builder: MutationConfigBuilder,
        command_line_builder: CommandLineBuilder,
        version_provider: V,
        runner: R,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            executable: executable.into(),
            initial_config_builder,
            mutation_config_builder,
            arguments_builder: ArgumentsAndOptionsBuilder,
            command_line_builder,
            version_provider,
            runner,
            max_output_bytes,
        }
    }

    pub fn name(&self) -> &'static str {
        "PhpSpec"
    }

    /// PhpSpec only reports through TAP.
    pub fn has_junit_report(&self) -> bool {
        false
    }

    pub fn tests_pass(&self, output: &str) -> bool {
        tap::tests_pass(output)
    }

    pub async fn version(&self) -> Result<String> {
        self.version_provider.version().await
    }

    pub fn initial_tests_fail_recommendations(&self, command_line: &str) -> String {
        format!(
            "Check the executed command to identify the problem: {}",
            command_line
        )
    }

    pub async fn build_initial_config(&self, skip_coverage: bool) -> Result<PathBuf> {
        let version = self.version().await?;
        self.initial_config_builder.build(&version, skip_coverage)
    }

    pub fn build_mutant_config(&self, mutation: &MutationContext) -> Result<PathBuf> {
        self.mutation_config_builder.build(mutation)
    }

    pub async fn initial_test_run_command_line(
        &self,
        extra_options: &str,
        php_extra_args: &[String],
        skip_coverage: bool,
    ) -> Result<Vec<String>> {
        let config_path = self.build_initial_config(skip_coverage).await?;
        Ok(self.command_line(&config_path, extra_options, php_extra_args))
    }

    /// Mutant runs never pass PHP arguments through.
    pub fn mutant_command_line(
        &self,
        mutation: &MutationContext,
        extra_options: &str,
    ) -> Result<Vec<String>> {
        let config_path = self.build_mutant_config(mutation)?;
        Ok(self.command_line(&config_path, extra_options, &[]))
    }

    /// Build the initial configuration, run PhpSpec against it and classify the output.
    pub async fn run_initial(
        &self,
        extra_options: &str,
        php_extra_args: &[String],
        skip_coverage: bool,
    ) -> Result<RunResult> {
        let config_path = self.build_initial_config(skip_coverage).await?;
        let command_line = self.command_line(&config_path, extra_options, php_extra_args);

        let result = self.execute(config_path, command_line).await?;
        if !result.tests_pass {
            tracing::warn!(
                "Initial test run failed. {}",
                self.initial_tests_fail_recommendations(&result.command_line.join(" "))
            );
        }

        Ok(result)
    }

    /// Build the mutant's configuration, run PhpSpec against it and classify the output.
    pub async fn run_mutant(
        &self,
        mutation: &MutationContext,
        extra_options: &str,
    ) -> Result<RunResult> {
        let config_path = self.build_mutant_config(mutation)?;
        let command_line = self.command_line(&config_path, extra_options, &[]);

        let result = self.execute(config_path, command_line).await?;
        tracing::info!("Mutant {}: {}", mutation.hash, result.outcome);

        Ok(result)
    }

    fn command_line(
        &self,
        config_path: &Path,
        extra_options: &str,
        php_extra_args: &[String],
    ) -> Vec<String> {
        let framework_args = self.arguments_builder.build(config_path, extra_options);
        self.command_line_builder
            .build(&self.executable, php_extra_args, &framework_args)
    }

    async fn execute(&self, config_path: PathBuf, command_line: Vec<String>) -> Result<RunResult> {
        let start = Instant::now();
        let result = self.runner.run(&command_line).await;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        // A non-zero exit is expected when specs fail; the TAP output decides.
        let (output, exit_code) = match result {
            Ok(output) => (output, Some(0)),
            Err(AdapterError::ProcessFailed {
                exit_code, output, ..
            }) => (output, exit_code),
            Err(AdapterError::ProcessTimeout { .. }) => {
                return Ok(RunResult {
                    config_path,
                    command_line,
                    tests_pass: false,
                    outcome: TestOutcome::Timeout,
                    exit_code: None,
                    output: None,
                    execution_time_ms,
                });
            }
            Err(e) => return Err(e),
        };

        let tests_pass = self.tests_pass(&output);

        Ok(RunResult {
            config_path,
            command_line,
            tests_pass,
            outcome: TestOutcome::from_tests_pass(tests_pass),
            exit_code,
            output: Some(truncate_output(&output, self.max_output_bytes)),
            execution_time_ms,
        })
    }
}

impl<R: ProcessRunner + Clone> PhpSpecAdapter<R, CachedVersionProvider<ProcessVersionProvider<R>>> {
    /// Wire an adapter from settings. The project's PhpSpec configuration is read
    /// and decoded once here and shared by every build.
    pub fn from_config(config: &AdapterConfig, runner: R) -> Result<Self> {
        let base = Arc::new(ConfigDocument::from_path(&config.phpspec_config_path())?);
        let matcher: Arc<dyn CoverageExtensionMatcher> = Arc::new(NameContains::default());
        let writer: Arc<dyn FileWriter> = Arc::new(FsFileWriter);

        let initial_config_builder = InitialConfigBuilder::new(
            &config.paths.tmp_dir,
            config.coverage_dir(),
            Arc::clone(&base),
            Arc::clone(&matcher),
            Arc::clone(&writer),
        );

        let template = MutationAutoloadTemplate::create(
            &config.paths.project_dir,
            &base,
            Interceptor::from(&config.interceptor),
        );
        let mutation_config_builder =
            MutationConfigBuilder::new(&config.paths.tmp_dir, base, template, matcher, writer);

        let command_line_builder = CommandLineBuilder::new(&config.phpspec.php_binary);
        let version_provider = CachedVersionProvider::new(ProcessVersionProvider::new(
            command_line_builder.build(&config.phpspec.executable, &[], &[]),
            runner.clone(),
        ));

        Ok(Self::new(
            &config.phpspec.executable,
            initial_config_builder,
            mutation_config_builder,
            command_line_builder,
            version_provider,
            runner,
            config.run.max_output_bytes,
        ))
    }
}
