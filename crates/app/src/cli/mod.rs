use clap::{Parser, Subcommand};

mod db;
mod key;

#[derive(Debug, Parser)]
#[command(name = "tessera-app", about = "Tessera identity server CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Key(key::KeyCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Key(command) => key::run(command),
            Commands::Db(command) => db::run(command).await,
        }
    }
}
