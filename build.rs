// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: worker count
fn workers_arg() -> Arg {
    Arg::new("workers")
        .short('w')
        .long("workers")
        .value_name("N")
        .help("Number of parallel workers")
}

/// Common argument: package path filter
fn filter_arg() -> Arg {
    Arg::new("filter")
        .short('f')
        .long("filter")
        .help("Sync only packages whose path contains this substring")
}

fn build_cli() -> Command {
    Command::new("rpmirror")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mirror, verify and snapshot RPM/YUM package repositories")
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Show debug messages"),
        )
        .subcommand(
            Command::new("url")
                .about("Mirror a repository from a URL")
                .arg(Arg::new("url").required(true).help("Remote yum repository URL"))
                .arg(Arg::new("destination").required(true).help("Local destination directory"))
                .arg(filter_arg())
                .arg(
                    Arg::new("meta")
                        .short('m')
                        .long("meta")
                        .action(ArgAction::SetTrue)
                        .help("Sync only the repository metadata"),
                )
                .arg(
                    Arg::new("insecure")
                        .short('i')
                        .long("insecure")
                        .action(ArgAction::SetTrue)
                        .help("Do not verify TLS peer certificates"),
                )
                .arg(Arg::new("cert").long("cert").help("Path to a TLS client certificate (PEM)"))
                .arg(Arg::new("key").long("key").help("Path to the TLS client key (PEM)"))
                .arg(
                    Arg::new("cacerts")
                        .long("cacerts")
                        .help("Comma-separated list of CA certificates (PEM)"),
                )
                .arg(workers_arg()),
        )
        .subcommand(
            Command::new("repo")
                .about("Mirror every repository listed in a yum repo file")
                .arg(Arg::new("repofile").required(true).help("Path to the yum repo file"))
                .arg(Arg::new("destination").required(true).help("Local destination directory"))
                .arg(Arg::new("release").short('r').long("release").help("Release version substituted for $releasever"))
                .arg(Arg::new("arch").long("arch").help("Base architecture substituted for $basearch"))
                .arg(filter_arg())
                .arg(
                    Arg::new("meta")
                        .short('m')
                        .long("meta")
                        .action(ArgAction::SetTrue)
                        .help("Sync only the repository metadata"),
                )
                .arg(
                    Arg::new("insecure")
                        .short('i')
                        .long("insecure")
                        .action(ArgAction::SetTrue)
                        .help("Do not verify TLS peer certificates"),
                )
                .arg(Arg::new("repoid").long("repoid").help("Only sync the repository with this name"))
                .arg(Arg::new("exclude").long("exclude").help("Skip repositories whose name contains any of these substrings"))
                .arg(
                    Arg::new("enabled")
                        .long("enabled")
                        .action(ArgAction::SetTrue)
                        .help("Only sync repositories marked enabled=1"),
                )
                .arg(Arg::new("name").long("name").help("Mirror into this directory name instead of the section name"))
                .arg(workers_arg()),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Snapshot one or more local repositories")
                .arg(Arg::new("destination").required(true).help("Destination directory for the snapshots"))
                .arg(Arg::new("sources").required(true).num_args(1..).help("Source repositories to snapshot"))
                .arg(
                    Arg::new("link")
                        .short('l')
                        .long("link")
                        .action(ArgAction::SetTrue)
                        .help("Create symlinks instead of copying packages"),
                )
                .arg(
                    Arg::new("createrepo")
                        .short('c')
                        .long("createrepo")
                        .action(ArgAction::SetTrue)
                        .help("Regenerate the index with createrepo"),
                )
                .arg(workers_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("rpmirror.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
