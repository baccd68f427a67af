use sealer::commands;
use sealer::output;

use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "seal", author, version, about = "Seal the secrets in a Helm values file with kubeseal", long_about = None)]
struct Cli {
    #[command(flatten)]
    args: commands::seal::SealArgs,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            output::info(e.render());
            return ExitCode::from(1);
        }
    };

    match commands::seal::run(cli.args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::failure(format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}
