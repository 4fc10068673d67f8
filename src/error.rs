//! Error types for the PhpSpec adapter.
//!
//! Configuration-shape errors are raised eagerly when a builder derives a run
//! configuration, before any process is spawned. Process and I/O failures are
//! surfaced as-is to the caller; nothing here retries.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Primary error type for adapter operations.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The `extensions` section uses a shape other than an associative map.
    #[error(transparent)]
    MalformedExtensionsFormat(#[from] MalformedExtensionsFormat),

    /// Coverage collection was requested but no coverage extension is registered.
    #[error(
        "No code coverage PhpSpec extension configured. Mutation testing requires one to \
         collect coverage: register a code coverage extension (e.g. \
         FriendsOfPhpSpec\\PhpSpec\\CodeCoverage\\CodeCoverageExtension) under \"extensions\", \
         or skip the coverage collection."
    )]
    NoCoverageExtensionConfigured,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The YAML document is valid but holds something the configuration model cannot.
    #[error("Unsupported PhpSpec configuration: {reason}")]
    UnsupportedYaml { reason: String },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start '{program}': {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully. The captured output is kept so
    /// that callers can still inspect it.
    #[error("'{program}' exited with status {}", .exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ProcessFailed {
        program: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("'{program}' timed out after {timeout_seconds} seconds")]
    ProcessTimeout {
        program: String,
        timeout_seconds: u64,
    },

    #[error("The value \"{value}\" is not a valid SemVer (sub)string.")]
    InvalidVersion { value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the runner version to a configuration-format error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn enrich_with_version(self, version: &str) -> Self {
        match self {
            Self::MalformedExtensionsFormat(err) => {
                Self::MalformedExtensionsFormat(err.enrich_with_version(version))
            }
            other => other,
        }
    }
}

/// The `extensions` entry of a PhpSpec configuration is not an associative map.
///
/// The list form (`extensions: [Foo\Extension]`) was dropped in PhpSpec 3.0; since the
/// failure is version-correlated, the message can carry the detected runner version.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.message())]
pub struct MalformedExtensionsFormat {
    found: &'static str,
    version: Option<String>,
}

impl MalformedExtensionsFormat {
    pub fn new(found: &'static str) -> Self {
        Self {
            found,
            version: None,
        }
    }

    /// Shape that was found instead of a map (`"list"`, `"string"`, ...).
    pub fn found(&self) -> &'static str {
        self.found
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn enrich_with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    fn message(&self) -> String {
        let message = format!(
            "Expected the PhpSpec \"extensions\" entry to be a map of extension class names \
             to their options, found a {}. The list format is no longer supported since \
             PhpSpec 3.0.",
            self.found
        );

        match &self.version {
            Some(version) => format!(
                "Could not recognise the current configuration format for the version \"{}\": {}",
                version, message
            ),
            None => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_extensions_message_names_shape() {
        let err = MalformedExtensionsFormat::new("list");
        let message = err.to_string();
        assert!(message.contains("found a list"));
        assert!(!message.starts_with("Could not recognise"));
    }

    #[test]
    fn test_malformed_extensions_is_a_std_error() {
        let err = MalformedExtensionsFormat::new("list").enrich_with_version("2.5.8");
        let dyn_err: &dyn std::error::Error = &err;

        assert!(dyn_err.source().is_none());
        let prefix = "Could not recognise the current configuration format for the version \"2.5.8\"";
        assert!(dyn_err.to_string().starts_with(prefix));
    }

    #[test]
    fn test_enrich_with_version_prefixes_message() {
        let original = MalformedExtensionsFormat::new("list");
        let enriched = original.clone().enrich_with_version("2.0.0");

        assert_eq!(original.version(), None);
        assert_eq!(enriched.version(), Some("2.0.0"));
        assert_eq!(
            enriched.to_string(),
            format!(
                "Could not recognise the current configuration format for the version \"2.0.0\": {}",
                original
            )
        );
    }

    #[test]
    fn test_adapter_error_enrich_only_touches_format_errors() {
        let err = AdapterError::from(MalformedExtensionsFormat::new("string"));
        match err.enrich_with_version("7.5.0") {
            AdapterError::MalformedExtensionsFormat(inner) => {
                assert_eq!(inner.version(), Some("7.5.0"));
                assert_eq!(inner.found(), "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = AdapterError::NoCoverageExtensionConfigured.enrich_with_version("7.5.0");
        assert!(matches!(err, AdapterError::NoCoverageExtensionConfigured));
    }

    #[test]
    fn test_process_failed_display() {
        let err = AdapterError::ProcessFailed {
            program: "phpspec".to_string(),
            exit_code: Some(1),
            output: String::new(),
        };
        assert_eq!(err.to_string(), "'phpspec' exited with status 1");

        let err = AdapterError::ProcessFailed {
            program: "phpspec".to_string(),
            exit_code: None,
            output: String::new(),
        };
        assert_eq!(err.to_string(), "'phpspec' exited with status unknown");
    }
}
