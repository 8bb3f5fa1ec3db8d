// src/main.rs
//! rpmirror - CLI entry point

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "rpmirror")]
#[command(version)]
#[command(about = "Mirror, verify and snapshot RPM/YUM package repositories", long_about = None)]
struct Cli {
    /// Show debug messages
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror a repository from a URL
    Url {
        /// Remote yum repository URL
        url: String,

        /// Local destination directory
        destination: String,

        /// Sync only packages whose path contains this substring
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Sync only the repository metadata
        #[arg(short, long)]
        meta: bool,

        /// Do not verify TLS peer certificates
        #[arg(short, long)]
        insecure: bool,

        /// Path to a TLS client certificate (PEM)
        #[arg(long, requires = "key")]
        cert: Option<PathBuf>,

        /// Path to the TLS client key (PEM)
        #[arg(long, requires = "cert")]
        key: Option<PathBuf>,

        /// Comma-separated list of CA certificates (PEM)
        #[arg(long, value_delimiter = ',')]
        cacerts: Vec<PathBuf>,

        /// Number of parallel download workers
        #[arg(short, long, default_value_t = num_cpus::get())]
        workers: usize,
    },

    /// Mirror every repository listed in a yum repo file
    Repo {
        /// Path to the yum repo file
        repofile: PathBuf,

        /// Local destination directory
        destination: PathBuf,

        /// Release version substituted for $releasever, e.g. 7.1
        #[arg(short, long, default_value = "")]
        release: String,

        /// Base architecture substituted for $basearch
        #[arg(long, default_value = "x86_64")]
        arch: String,

        /// Sync only packages whose path contains this substring
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Sync only the repository metadata
        #[arg(short, long)]
        meta: bool,

        /// Do not verify TLS peer certificates
        #[arg(short, long)]
        insecure: bool,

        /// Only sync the repository with this name
        #[arg(long)]
        repoid: Option<String>,

        /// Skip repositories whose name contains any of these substrings
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Only sync repositories marked enabled=1
        #[arg(long)]
        enabled: bool,

        /// Mirror into this directory name instead of the section name
        #[arg(long)]
        name: Option<String>,

        /// Number of parallel download workers
        #[arg(short, long, default_value_t = num_cpus::get())]
        workers: usize,
    },

    /// Snapshot one or more local repositories
    Snapshot {
        /// Destination directory for the snapshots
        destination: PathBuf,

        /// Source repositories to snapshot
        #[arg(required = true)]
        sources: Vec<String>,

        /// Create symlinks instead of copying packages
        #[arg(short, long)]
        link: bool,

        /// Regenerate the index with createrepo
        #[arg(short = 'c', long)]
        createrepo: bool,

        /// Number of parallel workers
        #[arg(short, long, default_value_t = num_cpus::get())]
        workers: usize,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Some(Commands::Url {
            url,
            destination,
            filter,
            meta,
            insecure,
            cert,
            key,
            cacerts,
            workers,
        }) => commands::cmd_sync_url(
            &url,
            &destination,
            &commands::UrlOptions {
                filter,
                meta_only: meta,
                insecure,
                cert,
                key,
                cacerts,
                workers,
            },
        ),

        Some(Commands::Repo {
            repofile,
            destination,
            release,
            arch,
            filter,
            meta,
            insecure,
            repoid,
            exclude,
            enabled,
            name,
            workers,
        }) => commands::cmd_sync_repofile(
            &repofile,
            &destination,
            &commands::RepoFileOptions {
                filter,
                meta_only: meta,
                insecure,
                release,
                basearch: arch,
                repoid,
                exclude,
                enabled_only: enabled,
                rename: name,
                workers,
            },
        ),

        Some(Commands::Snapshot {
            destination,
            sources,
            link,
            createrepo,
            workers,
        }) => commands::cmd_snapshot(&destination, &sources, link, createrepo, workers),

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "rpmirror", &mut io::stdout());
            Ok(())
        }

        None => {
            println!("rpmirror v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'rpmirror --help' for usage information");
            Ok(())
        }
    }
}
