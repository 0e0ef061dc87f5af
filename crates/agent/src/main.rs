mod cli;
mod shutdown;
mod startup;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    match cli.command {
        Some(cli::Command::Version) => {
            println!("flowsentry-agent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => startup::run(&cli.config).await,
    }
}
