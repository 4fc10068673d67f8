//! PhpSpec version detection.

use crate::error::{AdapterError, Result};
use crate::mutation::executor::ProcessRunner;
use regex::Regex;
use std::sync::LazyLock;
use tokio::sync::OnceCell;

/// SemVer, allowing surrounding text (`phpspec v7.5.0 by ...`) and four-part dated
/// versions such as `3.17.05.02`.
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:.+ [vV]?)?(?P<version>(?P<major>0|[1-9]\d*)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:\.\d+)?(?:-(?P<prerelease>(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+(?P<buildmetadata>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?)(?: .+)?",
    )
    .expect("version pattern is a valid regex")
});

/// Extracts a version from text such as the output of `phpspec --version`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionParser;

impl VersionParser {
    pub fn parse(&self, value: &str) -> Result<String> {
        VERSION_REGEX
            .captures(value)
            .and_then(|captures| captures.name("version"))
            .map(|version| version.as_str().to_string())
            .ok_or_else(|| AdapterError::InvalidVersion {
                value: value.to_string(),
            })
    }
}

/// Source of the PhpSpec version.
#[allow(async_fn_in_trait)]
pub trait VersionProvider {
    async fn version(&self) -> Result<String>;
}

/// A version known up front.
#[derive(Debug, Clone)]
pub struct StaticVersionProvider(pub String);

impl VersionProvider for StaticVersionProvider {
    async fn version(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Runs `<executable> --version` and parses the result.
#[derive(Debug, Clone)]
pub struct ProcessVersionProvider<R> {
    command_line: Vec<String>,
    runner: R,
    parser: VersionParser,
}

impl<R: ProcessRunner> ProcessVersionProvider<R> {
    /// `command_line` is the full PhpSpec invocation without arguments, e.g. the
    /// output of [`CommandLineBuilder::build`](crate::command_line::CommandLineBuilder::build).
    pub fn new(command_line: Vec<String>, runner: R) -> Self {
        Self {
            command_line,
            runner,
            parser: VersionParser,
        }
    }
}

impl<R: ProcessRunner> VersionProvider for ProcessVersionProvider<R> {
    async fn version(&self) -> Result<String> {
        let mut command_line = self.command_line.clone();
        command_line.push("--version".to_string());

        let output = self.runner.run(&command_line).await?;
        let version = self.parser.parse(output.trim())?;
        tracing::info!("Detected PhpSpec version {}", version);

        Ok(version)
    }
}

/// Asks the inner provider once and remembers the answer.
#[derive(Debug)]
pub struct CachedVersionProvider<P> {
    inner: P,
    version: OnceCell<String>,
}

impl<P: VersionProvider> CachedVersionProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            version: OnceCell::new(),
        }
    }
}

impl<P: VersionProvider> VersionProvider for CachedVersionProvider<P> {
    async fn version(&self) -> Result<String> {
        self.version
            .get_or_try_init(|| self.inner.version())
            .await
            .cloned()
    }
}
