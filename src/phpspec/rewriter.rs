//! Per-run rewriting of a decoded PhpSpec configuration.
//!
//! A [`ConfigurationRewriter`] owns its own copy of the document; callers derive
//! one rewriter per run from the shared base so that runs never observe each
//! other's changes.

use super::document::{ConfigDocument, ConfigMap, ConfigValue};
use crate::error::{AdapterError, MalformedExtensionsFormat, Result};
use std::sync::Arc;

const EXTENSIONS_KEY: &str = "extensions";
const BOOTSTRAP_KEY: &str = "bootstrap";

/// Decides whether a registered PhpSpec extension produces code coverage.
pub trait CoverageExtensionMatcher: Send + Sync {
    fn is_coverage_extension(&self, extension_name: &str) -> bool;
}

impl<F> CoverageExtensionMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_coverage_extension(&self, extension_name: &str) -> bool {
        self(extension_name)
    }
}

/// Matches extensions whose class name contains a fixed substring.
///
/// The default needle, `CodeCoverage`, recognises every known coverage package:
/// `PhpSpec\Extension\CodeCoverageExtension`, `PhpSpecCodeCoverage\CodeCoverageExtension`,
/// `LeanPHP\PhpSpec\CodeCoverage\CodeCoverageExtension` and
/// `FriendsOfPhpSpec\PhpSpec\CodeCoverage\CodeCoverageExtension`. Unknown extensions
/// are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameContains {
    needle: String,
}

impl NameContains {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

impl Default for NameContains {
    fn default() -> Self {
        Self::new("CodeCoverage")
    }
}

impl CoverageExtensionMatcher for NameContains {
    fn is_coverage_extension(&self, extension_name: &str) -> bool {
        extension_name.contains(&self.needle)
    }
}

/// Mutable view over one run's PhpSpec configuration.
pub struct ConfigurationRewriter {
    coverage_dir: String,
    document: ConfigDocument,
    matcher: Arc<dyn CoverageExtensionMatcher>,
}

impl std::fmt::Debug for ConfigurationRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationRewriter")
            .field("coverage_dir", &self.coverage_dir)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl ConfigurationRewriter {
    /// Create a rewriter using the default `CodeCoverage` name matcher.
    ///
    /// Fails with [`AdapterError::MalformedExtensionsFormat`] when `extensions` is
    /// present, non-null and not a map.
    pub fn new(coverage_dir: impl Into<String>, document: ConfigDocument) -> Result<Self> {
        Self::with_matcher(coverage_dir, document, Arc::new(NameContains::default()))
    }

    pub fn with_matcher(
        coverage_dir: impl Into<String>,
        document: ConfigDocument,
        matcher: Arc<dyn CoverageExtensionMatcher>,
    ) -> Result<Self> {
        assert_supported_extensions_format(&document)?;

        Ok(Self {
            coverage_dir: coverage_dir.into(),
            document,
            matcher,
        })
    }

    /// Drop every coverage extension entry. Returns how many were removed.
    pub fn remove_coverage_extension(&mut self) -> usize {
        let matcher = Arc::clone(&self.matcher);
        let Some(extensions) = self.extensions_mut() else {
            return 0;
        };

        let before = extensions.len();
        extensions.retain(|name, _| !matcher.is_coverage_extension(name));
        let removed = before - extensions.len();

        if removed > 0 {
            tracing::debug!("Removed {} code coverage extension(s)", removed);
        }
        removed
    }

    /// Point every coverage extension at the XML report directory, replacing any
    /// previously configured formats and outputs. Other options are kept.
    ///
    /// Fails with [`AdapterError::NoCoverageExtensionConfigured`] when nothing matches;
    /// the document is left untouched in that case.
    pub fn configure_coverage_for_run(&mut self) -> Result<usize> {
        if !self.has_coverage_extension() {
            return Err(AdapterError::NoCoverageExtensionConfigured);
        }

        let matcher = Arc::clone(&self.matcher);
        let coverage_dir = self.coverage_dir.clone();
        let mut configured = 0;

        if let Some(extensions) = self.extensions_mut() {
            for (name, options) in extensions.iter_mut() {
                if !matcher.is_coverage_extension(name) {
                    continue;
                }

                if options.as_mapping().is_none() {
                    *options = ConfigMap::new().into();
                }
                if let Some(options) = options.as_mapping_mut() {
                    options.insert("format", ConfigValue::Sequence(vec!["xml".into()]));
                    let output: ConfigMap = [("xml", ConfigValue::from(coverage_dir.as_str()))]
                        .into_iter()
                        .collect();
                    options.insert("output", output.into());
                }
                configured += 1;
            }
        }

        tracing::debug!(
            "Configured {} coverage extension(s) to write XML into {}",
            configured,
            coverage_dir
        );
        Ok(configured)
    }

    /// Set the `bootstrap` entry and move it to the front of the document.
    ///
    /// PhpSpec fails to populate its container in some setups unless `bootstrap`
    /// is the first key.
    pub fn set_bootstrap(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(AdapterError::Config(
                "the bootstrap path must not be empty".to_string(),
            ));
        }

        self.document
            .root_mut()
            .insert_first(BOOTSTRAP_KEY, ConfigValue::from(path));
        Ok(())
    }

    /// Serialize the current document.
    pub fn render(&self) -> Result<String> {
        self.document.encode()
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    fn has_coverage_extension(&self) -> bool {
        self.document
            .get(EXTENSIONS_KEY)
            .and_then(ConfigValue::as_mapping)
            .is_some_and(|extensions| {
                extensions
                    .keys()
                    .any(|name| self.matcher.is_coverage_extension(name))
            })
    }

    fn extensions_mut(&mut self) -> Option<&mut ConfigMap> {
        self.document
            .root_mut()
            .get_mut(EXTENSIONS_KEY)
            .and_then(ConfigValue::as_mapping_mut)
    }
}

fn assert_supported_extensions_format(document: &ConfigDocument) -> Result<()> {
    match document.get(EXTENSIONS_KEY) {
        None | Some(ConfigValue::Null) | Some(ConfigValue::Mapping(_)) => Ok(()),
        Some(other) => Err(MalformedExtensionsFormat::new(other.kind()).into()),
    }
}
