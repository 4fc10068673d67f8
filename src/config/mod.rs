use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::phpspec::autoload::Interceptor;

/// Directory under `tmp_dir` receiving the XML coverage report of the initial run.
pub const COVERAGE_DIR: &str = "phpspec-coverage-xml";

/// Adapter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// How PhpSpec is invoked
    #[serde(default)]
    pub phpspec: PhpSpecConfig,

    /// Where generated files go and where the project lives
    #[serde(default)]
    pub paths: PathsConfig,

    /// Include interceptor used by mutant autoload files
    #[serde(default)]
    pub interceptor: InterceptorConfig,

    /// Process execution limits
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhpSpecConfig {
    /// PhpSpec executable, either a script or a `.phar`
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Project's PhpSpec configuration, relative to `paths.project_dir`
    #[serde(default = "default_phpspec_config")]
    pub config: PathBuf,

    /// PHP interpreter used for `.phar` executables and PHP arguments
    #[serde(default = "default_php_binary")]
    pub php_binary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,

    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorConfig {
    /// Path of the PHP file defining the interceptor. Required for mutant runs.
    #[serde(default)]
    pub path: String,

    /// Fully qualified class name
    #[serde(default = "default_interceptor_class")]
    pub class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Wall-clock limit for one PhpSpec process
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Cap on output kept in run results
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_executable() -> String {
    "vendor/bin/phpspec".to_string()
}

fn default_phpspec_config() -> PathBuf {
    PathBuf::from("phpspec.yml")
}

fn default_php_binary() -> String {
    "php".to_string()
}

fn default_tmp_dir() -> PathBuf {
    std::env::temp_dir().join("phpspec-adapter")
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_interceptor_class() -> String {
    "Infection\\StreamWrapper\\IncludeInterceptor".to_string()
}

fn default_timeout_seconds() -> u64 {
    300 // 5 minutes
}

fn default_max_output_bytes() -> usize {
    10_000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for PhpSpecConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            config: default_phpspec_config(),
            php_binary: default_php_binary(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tmp_dir: default_tmp_dir(),
            project_dir: default_project_dir(),
        }
    }
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            class: default_interceptor_class(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl From<&InterceptorConfig> for Interceptor {
    fn from(config: &InterceptorConfig) -> Self {
        Interceptor {
            path: config.path.clone(),
            class: config.class.clone(),
        }
    }
}

impl AdapterConfig {
    /// Load configuration from file, or use defaults if not found
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::default_config_path);

        let config = if let Some(ref path) = config_path {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            } else {
                AdapterConfig::default()
            }
        } else {
            AdapterConfig::default()
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_config_path)
            .context("No config path available")?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "phpspec-adapter", "phpspec-adapter")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Directory receiving the initial run's XML coverage report
    pub fn coverage_dir(&self) -> PathBuf {
        self.paths.tmp_dir.join(COVERAGE_DIR)
    }

    /// The project's PhpSpec configuration file
    pub fn phpspec_config_path(&self) -> PathBuf {
        self.paths.project_dir.join(&self.phpspec.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Default value tests
    // =========================================================================

    #[test]
    fn test_default_general_config() {
        let config = GeneralConfig::default();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_default_phpspec_config() {
        let config = PhpSpecConfig::default();
        assert_eq!(config.executable, "vendor/bin/phpspec");
        assert_eq!(config.config, PathBuf::from("phpspec.yml"));
        assert_eq!(config.php_binary, "php");
    }

    #[test]
    fn test_default_paths_config() {
        let config = PathsConfig::default();
        assert!(config.tmp_dir.ends_with("phpspec-adapter"));
        assert_eq!(config.project_dir, PathBuf::from("."));
    }

    #[test]
    fn test_default_interceptor_config() {
        let config = InterceptorConfig::default();
        assert!(config.path.is_empty());
        assert_eq!(config.class, "Infection\\StreamWrapper\\IncludeInterceptor");
    }

    #[test]
    fn test_default_run_config() {
        let config = RunConfig::default();
        assert_eq!(config.timeout_seconds, 300);
        assert_eq!(config.max_output_bytes, 10_000);
    }

    // =========================================================================
    // Config parsing tests
    // =========================================================================

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[general]
log_level = "debug"

[phpspec]
executable = "tools/phpspec.phar"
"#;
        let config: AdapterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.phpspec.executable, "tools/phpspec.phar");
        // Defaults should still apply
        assert_eq!(config.phpspec.php_binary, "php");
        assert_eq!(config.run.timeout_seconds, 300);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[phpspec]
executable = "bin/phpspec"
config = "config/phpspec.yml.dist"
php_binary = "/usr/bin/php8.3"

[paths]
tmp_dir = "/tmp/infection"
project_dir = "/srv/app"

[interceptor]
path = "/srv/app/vendor/infection/include-interceptor/src/IncludeInterceptor.php"
class = 'Acme\Interceptor'

[run]
timeout_seconds = 30
max_output_bytes = 512
"#;
        let config: AdapterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.phpspec.config, PathBuf::from("config/phpspec.yml.dist"));
        assert_eq!(config.paths.tmp_dir, PathBuf::from("/tmp/infection"));
        assert_eq!(config.interceptor.class, "Acme\\Interceptor");
        assert_eq!(config.run.timeout_seconds, 30);
        assert_eq!(config.run.max_output_bytes, 512);
        assert_eq!(
            config.phpspec_config_path(),
            PathBuf::from("/srv/app/config/phpspec.yml.dist")
        );
    }

    #[test]
    fn test_empty_config() {
        let config: AdapterConfig = toml::from_str("").unwrap();
        // All defaults should apply
        assert_eq!(config.phpspec.executable, "vendor/bin/phpspec");
        assert_eq!(config.run.max_output_bytes, 10_000);
        assert!(config.interceptor.path.is_empty());
    }

    #[test]
    fn test_coverage_dir() {
        let mut config = AdapterConfig::default();
        config.paths.tmp_dir = PathBuf::from("/tmp/infection");
        assert_eq!(
            config.coverage_dir(),
            PathBuf::from("/tmp/infection/phpspec-coverage-xml")
        );
    }

    #[test]
    fn test_interceptor_from_config() {
        let config = InterceptorConfig {
            path: "/x/IncludeInterceptor.php".to_string(),
            class: "Acme\\Interceptor".to_string(),
        };
        let interceptor = Interceptor::from(&config);
        assert_eq!(interceptor.path, "/x/IncludeInterceptor.php");
        assert_eq!(interceptor.class, "Acme\\Interceptor");
    }

    // =========================================================================
    // File I/O tests
    // =========================================================================

    #[test]
    fn test_config_load_nonexistent() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::remove_file(temp_file.path()).unwrap();

        let config = AdapterConfig::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.phpspec.executable, "vendor/bin/phpspec");
    }

    #[test]
    fn test_config_load_valid_file() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        let toml_content = r#"
[general]
log_level = "debug"

[run]
timeout_seconds = 10
"#;

        std::fs::write(temp_file.path(), toml_content).unwrap();

        let config = AdapterConfig::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.run.timeout_seconds, 10);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        std::fs::write(temp_file.path(), "invalid {{{{ toml").unwrap();

        let result = AdapterConfig::load(Some(temp_file.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        let mut config = AdapterConfig::default();
        config.interceptor.path = "/x/IncludeInterceptor.php".to_string();
        config.save(Some(temp_file.path())).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("log_level"));
        assert!(content.contains("executable"));
        assert!(content.contains("timeout_seconds"));

        let reloaded = AdapterConfig::load(Some(temp_file.path())).unwrap();
        assert_eq!(reloaded.interceptor.path, "/x/IncludeInterceptor.php");
    }

    #[test]
    fn test_config_save_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("subdir").join("config.toml");

        let config = AdapterConfig::default();
        config.save(Some(&config_path)).unwrap();

        assert!(config_path.exists());
    }

    #[test]
    fn test_default_config_path() {
        let path = AdapterConfig::default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("config.toml"));
    }
}
