use clap::Parser;

use tariff_cli::{Cli, app, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_file.as_deref())?;

    app::run(&cli)
}
