use clap::Args;
use tessera_app::database;

#[derive(Debug, Args)]
pub(crate) struct MigrateArgs {
    /// `SQLite` connection string
    #[arg(long, env = "DATABASE_URL", default_value = database::DEFAULT_DATABASE_URL)]
    database_url: String,
}

pub(crate) async fn run(args: MigrateArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to run migrations: {error}"))?;

    println!("migrations applied to {}", args.database_url);

    Ok(())
}
