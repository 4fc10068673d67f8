//! PhpSpec adapter for mutation testing.
//!
//! Rewrites a project's PhpSpec configuration for the initial coverage run and for
//! each mutant, builds the command lines that run PhpSpec, and classifies its TAP
//! output as a pass or a failure.

pub mod adapter;
pub mod command_line;
pub mod config;
pub mod error;
pub mod mutation;
pub mod phpspec;
pub mod tap;
pub mod version;

pub use adapter::PhpSpecAdapter;
pub use config::AdapterConfig;
pub use error::{AdapterError, MalformedExtensionsFormat, Result};
