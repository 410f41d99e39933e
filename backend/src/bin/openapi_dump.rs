//! Print the OpenAPI document as JSON.

use clap::Parser;
use ledger_backend::ApiDoc;
use utoipa::OpenApi;

/// Command-line options for the dump.
#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Print the ledger backend OpenAPI document")]
struct Cli {
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let doc = ApiDoc::openapi();
    let json = if cli.pretty {
        doc.to_pretty_json()?
    } else {
        doc.to_json()?
    };
    println!("{json}");
    Ok(())
}
