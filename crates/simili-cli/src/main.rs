mod auto_close_command;
mod bootstrap_helpers;
mod cli_args;

use anyhow::{Context, Result};
use clap::Parser;

use crate::auto_close_command::execute_auto_close;
use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::{Cli, CliCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        CliCommand::AutoClose(args) => {
            let result = execute_auto_close(args)?;
            let rendered =
                serde_json::to_string_pretty(&result).context("failed to render result")?;
            println!("{rendered}");
        }
    }
    Ok(())
}
