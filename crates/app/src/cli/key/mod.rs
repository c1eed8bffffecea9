use std::path::PathBuf;

use clap::{Args, Subcommand};

mod generate;
mod show;

#[derive(Debug, Args)]
pub(crate) struct KeyCommand {
    #[command(subcommand)]
    command: KeySubcommand,
}

#[derive(Debug, Subcommand)]
enum KeySubcommand {
    Generate(generate::GenerateKeyArgs),
    Show(show::ShowKeyArgs),
}

/// Location of the signing key file shared by the key subcommands.
#[derive(Debug, Args)]
pub(crate) struct KeyFileArgs {
    /// Name this server signs as
    #[arg(long, env = "SERVER_NAME")]
    server_name: String,

    /// Path of the ed25519 signing key file
    #[arg(long, env = "SIGNING_KEY_PATH", default_value = "tessera.signing.key")]
    signing_key_path: PathBuf,
}

pub(crate) fn run(command: KeyCommand) -> Result<(), String> {
    match command.command {
        KeySubcommand::Generate(args) => generate::run(&args),
        KeySubcommand::Show(args) => show::run(&args),
    }
}
