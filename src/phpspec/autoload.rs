//! Bootstrap file injected into mutant runs.
//!
//! The generated PHP file requires the project's own bootstrap (if any), then
//! registers the include interceptor so that requiring the original source file
//! loads the mutated copy instead.

use super::document::{ConfigDocument, ConfigValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Location and class of the host's include interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interceptor {
    /// Path of the PHP file defining the interceptor class.
    pub path: String,
    /// Fully qualified class name, e.g. `Infection\StreamWrapper\IncludeInterceptor`.
    pub class: String,
}

impl Interceptor {
    fn short_name(&self) -> &str {
        self.class.rsplit('\\').next().unwrap_or(&self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationAutoloadTemplate {
    original_bootstrap: Option<String>,
    interceptor: Interceptor,
}

impl MutationAutoloadTemplate {
    /// Prepare the template for a project. The project's `bootstrap` entry, when it
    /// is a string, is resolved against `project_dir`.
    pub fn create(project_dir: &Path, config: &ConfigDocument, interceptor: Interceptor) -> Self {
        let original_bootstrap = config
            .get("bootstrap")
            .and_then(ConfigValue::as_str)
            .map(|bootstrap| format!("{}/{}", project_dir.display(), bootstrap));

        Self {
            original_bootstrap,
            interceptor,
        }
    }

    pub fn original_bootstrap(&self) -> Option<&str> {
        self.original_bootstrap.as_deref()
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Render the autoload file for one original/mutated file pair.
    pub fn build(&self, original_file_path: &str, mutated_file_path: &str) -> String {
        let require_bootstrap = self
            .original_bootstrap
            .as_ref()
            .map(|bootstrap| format!("require_once '{}';", bootstrap))
            .unwrap_or_default();
        let short_name = self.interceptor.short_name();

        format!(
            "<?php\n\
             \n\
             {require_bootstrap}\n\
             \n\
             require_once '{interceptor_path}';\n\
             \n\
             use {interceptor_class};\n\
             \n\
             {short_name}::intercept('{original_file_path}', '{mutated_file_path}');\n\
             {short_name}::enable();\n",
            interceptor_path = self.interceptor.path,
            interceptor_class = self.interceptor.class,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL_FILE_PATH: &str = "/original/file/path";
    const MUTATED_FILE_PATH: &str = "/mutated/file/path";

    fn interceptor() -> Interceptor {
        Interceptor {
            path: "/host/src/StreamWrapper/IncludeInterceptor.php".to_string(),
            class: "Infection\\StreamWrapper\\IncludeInterceptor".to_string(),
        }
    }

    fn template(yaml: &str) -> MutationAutoloadTemplate {
        MutationAutoloadTemplate::create(
            Path::new("/project/dir"),
            &ConfigDocument::decode(yaml).unwrap(),
            interceptor(),
        )
    }

    #[test]
    fn test_with_bootstrap_file() {
        let template = template(
            "bootstrap: bootstrap.php\nextensions:\n    CodeCoverageExtension: ~\n    TestExtension:\n        options: 123\n",
        );

        let expected = "<?php\n\
                        \n\
                        require_once '/project/dir/bootstrap.php';\n\
                        \n\
                        require_once '/host/src/StreamWrapper/IncludeInterceptor.php';\n\
                        \n\
                        use Infection\\StreamWrapper\\IncludeInterceptor;\n\
                        \n\
                        IncludeInterceptor::intercept('/original/file/path', '/mutated/file/path');\n\
                        IncludeInterceptor::enable();\n";

        assert_eq!(template.build(ORIGINAL_FILE_PATH, MUTATED_FILE_PATH), expected);
    }

    #[test]
    fn test_without_bootstrap_file() {
        let template = template("extensions:\n    CodeCoverageExtension: ~\n");

        let expected = "<?php\n\
                        \n\
                        \n\
                        \n\
                        require_once '/host/src/StreamWrapper/IncludeInterceptor.php';\n\
                        \n\
                        use Infection\\StreamWrapper\\IncludeInterceptor;\n\
                        \n\
                        IncludeInterceptor::intercept('/original/file/path', '/mutated/file/path');\n\
                        IncludeInterceptor::enable();\n";

        assert_eq!(template.original_bootstrap(), None);
        assert_eq!(template.build(ORIGINAL_FILE_PATH, MUTATED_FILE_PATH), expected);
    }

    #[test]
    fn test_null_bootstrap_is_ignored() {
        let template = template("bootstrap: ~\n");
        assert_eq!(template.original_bootstrap(), None);
    }

    #[test]
    fn test_short_name_without_namespace() {
        let template = MutationAutoloadTemplate::create(
            Path::new("/project"),
            &ConfigDocument::default(),
            Interceptor {
                path: "/i.php".to_string(),
                class: "Interceptor".to_string(),
            },
        );

        let output = template.build("/a.php", "/b.php");
        assert!(output.contains("use Interceptor;\n"));
        assert!(output.contains("Interceptor::intercept('/a.php', '/b.php');\n"));
    }
}
