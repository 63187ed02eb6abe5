//! `scopeddnsutil` entry point.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use scoped_dns::util::is_root;
use scoped_dns::{ScopedDnsConfig, ScopedDnsManager, Verbosity, coalesce};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Bind domains and IPv4 reverse zones to specific DNS resolvers.
#[derive(Parser, Debug)]
#[command(name = "scopeddnsutil")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add (or update) a scoped DNS entry
    Add(EntryArgs),
    /// Remove the scoped DNS entry overlapping the given domains and resolvers
    Remove(EntryArgs),
}

#[derive(Args, Debug)]
struct EntryArgs {
    /// IP address(es) of DNS resolvers
    #[arg(short, long, value_name = "IP[,IP...]")]
    resolvers: String,

    /// Domain(s) to scope these resolvers for
    #[arg(short, long, value_name = "DOMAIN[,DOMAIN...]")]
    domains: String,

    /// IP address ranges in CIDR notation to scope to these resolvers
    #[arg(short = 'i', long, value_name = "CIDR[,CIDR...]")]
    cidrs: Option<String>,

    /// Show detailed output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (args, adding) = match &cli.command {
        Command::Add(args) => (args, true),
        Command::Remove(args) => (args, false),
    };

    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    let config =
        ScopedDnsConfig::from_command_line(&args.domains, args.cidrs.as_deref(), &args.resolvers);
    if !is_root() {
        tracing::warn!("Not running as root; the configuration store will likely reject changes");
    }

    let manager = ScopedDnsManager::system();
    let result = if adding {
        add(&manager, &config, verbosity)
    } else {
        remove(&manager, &config, verbosity)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if verbosity > Verbosity::Quiet {
                eprintln!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn add(
    manager: &ScopedDnsManager<scoped_dns::ScutilStore>,
    config: &ScopedDnsConfig,
    verbosity: Verbosity,
) -> anyhow::Result<()> {
    manager
        .add(config)
        .context("Failed to add scoped DNS entry")?;

    report(
        verbosity,
        "Added scoped DNS entry",
        || {
            format!(
                "Added scoped DNS entry for {} with resolver(s) {}",
                config.domains,
                config.resolvers.join(", ")
            )
        },
    );
    Ok(())
}

fn remove(
    manager: &ScopedDnsManager<scoped_dns::ScutilStore>,
    config: &ScopedDnsConfig,
    verbosity: Verbosity,
) -> anyhow::Result<()> {
    let removed = manager
        .remove(config)
        .context("Failed to remove scoped DNS entry")?;

    report(
        verbosity,
        "Removed scoped DNS entry",
        || {
            format!(
                "Removed scoped DNS entry for {} with resolver(s) {}",
                coalesce(&removed.record.supplemental_match_domains),
                removed.record.server_addresses.join(", ")
            )
        },
    );
    Ok(())
}

/// Prints the short message, or the detailed one when verbose.
fn report(verbosity: Verbosity, simple: &str, detailed: impl FnOnce() -> String) {
    match verbosity {
        Verbosity::Quiet => {}
        Verbosity::Normal => println!("{simple}"),
        Verbosity::Verbose => println!("{}", detailed()),
    }
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
