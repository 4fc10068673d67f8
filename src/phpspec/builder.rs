//! Builders that materialize one PhpSpec configuration file per run.
//!
//! Both builders share a decoded base document and derive an independent copy for
//! every build.

use super::autoload::MutationAutoloadTemplate;
use super::document::ConfigDocument;
use super::rewriter::{ConfigurationRewriter, CoverageExtensionMatcher};
use crate::error::{AdapterError, Result};
use crate::mutation::MutationContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Destination for generated files.
pub trait FileWriter: Send + Sync {
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes to the local filesystem, creating parent directories as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileWriter;

impl FileWriter for FsFileWriter {
    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AdapterError::io(parent, e))?;
        }
        std::fs::write(path, contents).map_err(|e| AdapterError::io(path, e))
    }
}

/// Builds the configuration used by the initial (coverage-collecting) test run.
pub struct InitialConfigBuilder {
    tmp_dir: PathBuf,
    coverage_dir: PathBuf,
    base: Arc<ConfigDocument>,
    matcher: Arc<dyn CoverageExtensionMatcher>,
    writer: Arc<dyn FileWriter>,
}

impl InitialConfigBuilder {
    pub fn new(
        tmp_dir: impl Into<PathBuf>,
        coverage_dir: impl Into<PathBuf>,
        base: Arc<ConfigDocument>,
        matcher: Arc<dyn CoverageExtensionMatcher>,
        writer: Arc<dyn FileWriter>,
    ) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            coverage_dir: coverage_dir.into(),
            base,
            matcher,
            writer,
        }
    }

    /// Write the initial run configuration and return its path.
    ///
    /// With `skip_coverage` the coverage extensions are dropped; otherwise they are
    /// redirected to the XML report directory, which requires at least one.
    pub fn build(&self, version: &str, skip_coverage: bool) -> Result<PathBuf> {
        let path = self.tmp_dir.join("phpspecConfiguration.initial.infection.yml");

        let mut configuration = ConfigurationRewriter::with_matcher(
            self.coverage_dir.display().to_string(),
            (*self.base).clone(),
            Arc::clone(&self.matcher),
        )
        .map_err(|e| e.enrich_with_version(version))?;

        if skip_coverage {
            configuration.remove_coverage_extension();
        } else {
            configuration.configure_coverage_for_run()?;
        }

        self.writer.write(&path, &configuration.render()?)?;
        tracing::info!("Wrote initial PhpSpec configuration to {}", path.display());

        Ok(path)
    }
}

/// Builds the configuration and autoload file for one mutant.
pub struct MutationConfigBuilder {
    tmp_dir: PathBuf,
    base: Arc<ConfigDocument>,
    template: MutationAutoloadTemplate,
    matcher: Arc<dyn CoverageExtensionMatcher>,
    writer: Arc<dyn FileWriter>,
}

impl MutationConfigBuilder {
    pub fn new(
        tmp_dir: impl Into<PathBuf>,
        base: Arc<ConfigDocument>,
        template: MutationAutoloadTemplate,
        matcher: Arc<dyn CoverageExtensionMatcher>,
        writer: Arc<dyn FileWriter>,
    ) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            base,
            template,
            matcher,
            writer,
        }
    }

    pub fn autoload_path(&self, hash: &str) -> PathBuf {
        self.tmp_dir
            .join(format!("interceptor.phpspec.autoload.{}.infection.php", hash))
    }

    pub fn config_path(&self, hash: &str) -> PathBuf {
        self.tmp_dir.join(format!("phpspecConfiguration.{}.infection.yml", hash))
    }

    /// Write the mutant's autoload file and configuration, returning the configuration path.
    pub fn build(&self, mutation: &MutationContext) -> Result<PathBuf> {
        // Coverage is only collected by the initial run.
        let mut configuration = ConfigurationRewriter::with_matcher(
            String::new(),
            (*self.base).clone(),
            Arc::clone(&self.matcher),
        )
        .map_err(|e| e.enrich_with_version(&mutation.version))?;

        if self.template.interceptor().path.is_empty() {
            return Err(AdapterError::Config(
                "the include interceptor path must be set to build mutant configurations"
                    .to_string(),
            ));
        }

        let autoload_path = self.autoload_path(&mutation.hash);
        self.writer.write(
            &autoload_path,
            &self.template.build(
                &mutation.original_path.display().to_string(),
                &mutation.mutated_path.display().to_string(),
            ),
        )?;

        configuration.set_bootstrap(&autoload_path.display().to_string())?;
        configuration.remove_coverage_extension();

        let path = self.config_path(&mutation.hash);
        self.writer.write(&path, &configuration.render()?)?;

        tracing::debug!(
            "Wrote mutant {} configuration to {} ({} covering test(s))",
            mutation.hash,
            path.display(),
            mutation.tests.len()
        );

        Ok(path)
    }
}
