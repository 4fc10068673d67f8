use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use phpspec_adapter::mutation::executor::TokioProcessRunner;
use phpspec_adapter::mutation::{content_hash, MutationContext};
use phpspec_adapter::version::{CachedVersionProvider, ProcessVersionProvider};
use phpspec_adapter::{tap, AdapterConfig, PhpSpecAdapter};

#[derive(Parser)]
#[command(name = "phpspec-adapter")]
#[command(version)]
#[command(about = "PhpSpec integration for mutation testing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the configuration for the initial test run and print its path
    InitialConfig {
        /// Drop coverage extensions instead of redirecting them to XML
        #[arg(long)]
        skip_coverage: bool,
    },
    /// Write the configuration and autoload file for one mutant and print the config path
    MutantConfig {
        #[command(flatten)]
        mutant: MutantArgs,
    },
    /// Classify TAP output read from a file or stdin
    Classify {
        /// File containing the output; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Run the initial test suite and print the result as JSON
    RunInitial {
        #[arg(long)]
        skip_coverage: bool,

        /// Extra options appended to the PhpSpec arguments
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        extra_options: String,

        /// Argument for the PHP interpreter (repeatable)
        #[arg(long = "php-arg", allow_hyphen_values = true)]
        php_args: Vec<String>,
    },
    /// Run the test suite against one mutant and print the result as JSON
    RunMutant {
        #[command(flatten)]
        mutant: MutantArgs,

        /// Extra options appended to the PhpSpec arguments
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        extra_options: String,
    },
    /// Print the detected PhpSpec version
    Version,
}

#[derive(clap::Args)]
struct MutantArgs {
    /// Source file the mutant replaces
    #[arg(long)]
    original: PathBuf,

    /// Mutated copy of the source file
    #[arg(long)]
    mutated: PathBuf,

    /// Mutant identifier; defaults to the SHA-256 of the mutated file
    #[arg(long)]
    hash: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AdapterConfig::load(cli.config.as_deref())?;

    // Initialize logging; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().or_else(AdapterConfig::default_config_path);
    tracing::debug!(
        "Config path: {}",
        config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none, using defaults)".to_string())
    );

    match cli.command {
        Commands::Classify { file } => {
            let output = read_output(file.as_deref()).await?;
            if tap::tests_pass(&output) {
                println!("pass");
            } else {
                println!("fail");
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::InitialConfig { skip_coverage } => {
            let adapter = build_adapter(&config)?;
            let path = adapter.build_initial_config(skip_coverage).await?;
            println!("{}", path.display());
        }
        Commands::MutantConfig { mutant } => {
            let adapter = build_adapter(&config)?;
            let mutation = mutant.into_context(adapter.version().await?).await?;
            let path = adapter.build_mutant_config(&mutation)?;
            println!("{}", path.display());
        }
        Commands::RunInitial {
            skip_coverage,
            extra_options,
            php_args,
        } => {
            let adapter = build_adapter(&config)?;
            let result = adapter
                .run_initial(&extra_options, &php_args, skip_coverage)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::RunMutant {
            mutant,
            extra_options,
        } => {
            let adapter = build_adapter(&config)?;
            let mutation = mutant.into_context(adapter.version().await?).await?;
            let result = adapter.run_mutant(&mutation, &extra_options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Version => {
            let adapter = build_adapter(&config)?;
            println!("{}", adapter.version().await?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

type Adapter = PhpSpecAdapter<
    TokioProcessRunner,
    CachedVersionProvider<ProcessVersionProvider<TokioProcessRunner>>,
>;

fn build_adapter(config: &AdapterConfig) -> anyhow::Result<Adapter> {
    let runner = TokioProcessRunner::new(config.run.timeout_seconds);
    PhpSpecAdapter::from_config(config, runner).with_context(|| {
        format!(
            "Failed to load PhpSpec configuration from {:?}",
            config.phpspec_config_path()
        )
    })
}

impl MutantArgs {
    async fn into_context(self, version: String) -> anyhow::Result<MutationContext> {
        let hash = match self.hash {
            Some(hash) => hash,
            None => {
                let contents = tokio::fs::read(&self.mutated)
                    .await
                    .with_context(|| format!("Failed to read mutant {:?}", self.mutated))?;
                content_hash(&contents)
            }
        };

        Ok(MutationContext {
            original_path: self.original,
            mutated_path: self.mutated,
            hash,
            tests: Vec::new(),
            version,
        })
    }
}

async fn read_output(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path)),
        None => {
            let mut output = String::new();
            tokio::io::stdin()
                .read_to_string(&mut output)
                .await
                .context("Failed to read stdin")?;
            Ok(output)
        }
    }
}
