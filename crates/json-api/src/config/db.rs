//! Database Config

use clap::Args;
use tessera_app::database::DEFAULT_DATABASE_URL;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `SQLite` connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}
