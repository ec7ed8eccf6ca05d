// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - a chat companion with two-tier conversation memory.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod records;
mod shell;
mod startup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use recall_config::RecallConfig;
use recall_core::RecallError;

/// Recall - a chat companion with two-tier conversation memory.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive chat session (default).
    Shell,
    /// Inspect or edit long-term memory.
    Records {
        #[command(subcommand)]
        action: RecordsCommand,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RecordsCommand {
    /// List records, newest first.
    List {
        /// Only records from this session.
        #[arg(long)]
        session: Option<String>,
        /// Maximum number of records to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one record in full.
    Show { id: String },
    /// Delete one record.
    Forget { id: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and report problems.
    Check,
    /// Print the effective configuration as TOML.
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell::run_shell(config).await,
        Commands::Records { action } => run_records(&config, action).await,
        Commands::Config { action } => run_config(&config, action),
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run_records(config: &RecallConfig, action: RecordsCommand) -> Result<(), RecallError> {
    let store = startup::open_sqlite(config).await?;
    let mut out = std::io::stdout().lock();
    match action {
        RecordsCommand::List { session, limit } => {
            records::list_records(&store, session, limit, &mut out).await
        }
        RecordsCommand::Show { id } => records::show_record(&store, &id, &mut out).await,
        RecordsCommand::Forget { id } => records::forget_record(&store, &id, &mut out)
            .await
            .map(|_| ()),
    }
}

fn run_config(config: &RecallConfig, action: ConfigCommand) -> Result<(), RecallError> {
    match action {
        ConfigCommand::Check => {
            println!(
                "{} (agent.name={}, memory.active_limit={}, memory.persistence={:?})",
                "config OK".green(),
                config.agent.name,
                config.memory.active_limit,
                config.memory.persistence
            );
            Ok(())
        }
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| RecallError::Internal(format!("failed to render config: {e}")))?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shell_is_the_default_command() {
        let cli = Cli::try_parse_from(["recall"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn records_list_parses_flags() {
        let cli = Cli::try_parse_from([
            "recall", "records", "list", "--session", "abc", "--limit", "5",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Records {
                action: RecordsCommand::List { session, limit },
            }) => {
                assert_eq!(session.as_deref(), Some("abc"));
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["recall", "config", "check", "--config", "/tmp/r.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&RecallConfig::default()).unwrap();
        assert!(rendered.contains("[memory]"));
        assert!(rendered.contains("active_limit = 100"));
    }
}
