//! Print the OpenAPI document as JSON, or write it to a file.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use upvote::ApiDoc;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "openapi-dump",
    about = "Export the upvote OpenAPI document",
    version
)]
struct CliArgs {
    /// Write the document here instead of standard output.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
    /// Emit compact rather than pretty-printed JSON.
    #[arg(long)]
    compact: bool,
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let doc = ApiDoc::openapi();
    let json = if args.compact {
        doc.to_json()
    } else {
        doc.to_pretty_json()
    }
    .map_err(io::Error::other)?;

    match args.output {
        Some(path) => std::fs::write(path, json),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
