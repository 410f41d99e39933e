//! Command-line entry point for the backend boundary lint.

use std::path::PathBuf;
use std::process::ExitCode;

use architecture_lint::{RULES, lint_backend_sources};
use clap::Parser;

/// Check the backend sources against the boundary rules.
#[derive(Debug, Parser)]
#[command(name = "architecture-lint", about = "Check ledger backend layer boundaries")]
struct Cli {
    /// Backend crate directory; defaults to the workspace's `backend/`.
    #[arg(long, value_name = "DIR")]
    backend_dir: Option<PathBuf>,
    /// Print the rules and exit.
    #[arg(long)]
    list_rules: bool,
}

fn default_backend_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("backend")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_rules {
        for rule in RULES {
            let forbidden: Vec<String> = rule.forbidden.iter().map(ToString::to_string).collect();
            println!("{}: {} may not name {}", rule.name, rule.scope.join(", "), forbidden.join(", "));
        }
        return ExitCode::SUCCESS;
    }

    let backend_dir = cli.backend_dir.unwrap_or_else(default_backend_dir);
    match lint_backend_sources(&backend_dir) {
        Ok(()) => {
            println!("{} rules hold under {}", RULES.len(), backend_dir.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
