use std::path::Path;

use clap::Parser;
use csv_mailer::{logging::init_logging, run, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _handle = init_logging(cli.log_level.into(), Path::new(&cli.log_filename))?;
    run(cli).await?;
    Ok(())
}
