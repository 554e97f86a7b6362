use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use folio_kernel::Settings;
use folio_store::Store;

/// FOLIO catalog and interest tracking
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the merged OpenAPI document
    Openapi,
    /// Load the layered configuration and print the result
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => folio_app::bootstrap::run().await,
        Command::Openapi => {
            let settings = Settings::load().with_context(|| "failed to load FOLIO settings")?;
            let store = Arc::new(Store::new());
            let registry = folio_app::bootstrap::build_registry(&store, &settings);
            let spec = folio_http::router::merged_openapi(&registry);
            println!("{}", serde_json::to_string_pretty(&spec)?);
            Ok(())
        }
        Command::CheckConfig => {
            let settings = Settings::load().with_context(|| "failed to load FOLIO settings")?;
            println!("{settings:#?}");
            Ok(())
        }
    }
}
