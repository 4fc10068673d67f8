//! PhpSpec configuration handling.
//!
//! This module provides:
//! - An order-preserving model of the project's YAML configuration ([`document`])
//! - Rewrites applied to that configuration per run ([`rewriter`])
//! - The autoload file that swaps in a mutated source file ([`autoload`])
//! - Builders writing the per-run files to disk ([`builder`])

pub mod autoload;
pub mod builder;
pub mod document;
pub mod rewriter;

pub use autoload::{Interceptor, MutationAutoloadTemplate};
pub use builder::{FileWriter, FsFileWriter, InitialConfigBuilder, MutationConfigBuilder};
pub use document::{ConfigDocument, ConfigMap, ConfigValue};
pub use rewriter::{ConfigurationRewriter, CoverageExtensionMatcher, NameContains};
