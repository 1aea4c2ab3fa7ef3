//! posemirror CLI Entry Point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use posemirror_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => {
            posemirror_cli::replay::execute(args).await?;
        }
        Commands::Compare(args) => {
            posemirror_cli::compare::execute(args).await?;
        }
        Commands::Config(args) => {
            posemirror_cli::settings::execute(args)?;
        }
        Commands::Version => {
            println!("posemirror {}", env!("CARGO_PKG_VERSION"));
            println!("core version: {}", posemirror_core::VERSION);
        }
    }

    Ok(())
}
