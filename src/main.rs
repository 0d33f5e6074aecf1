use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use polaris_drive::cli::commands::Commands;
use polaris_drive::cli::{Cli, CollectCommandHandler, DataCommandHandler, data};
use polaris_drive::config::Settings;
use polaris_drive::storage::{SampleStore, SqliteSampleStore};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        settings.storage.data_dir = data_dir;
    }

    // The codec lookup needs no database
    if let Commands::Band { family, channel } = cli.command {
        data::handle_band_command(family.into(), channel);
        return Ok(());
    }

    let store: Arc<dyn SampleStore> = Arc::new(SqliteSampleStore::open(settings.database_path())?);
    let handler = DataCommandHandler::new(settings.clone(), Arc::clone(&store));

    match cli.command {
        Commands::Collect {
            interval,
            probes,
            duration,
        } => {
            CollectCommandHandler::new(settings, store)
                .handle_collect_command(interval, probes, duration)
                .await?;
        }
        Commands::Export { output } => handler.handle_export_command(output.as_deref())?,
        Commands::Upload { server } => handler.handle_upload_command(server).await?,
        Commands::Signup {
            username,
            password,
            server,
        } => {
            handler
                .handle_signup_command(&username, &password, server)
                .await?
        }
        Commands::History {
            limit,
            hours,
            technology,
            operator,
        } => handler.handle_history_command(
            limit,
            hours,
            technology.as_deref(),
            operator.as_deref(),
        )?,
        Commands::Stats => handler.handle_stats_command()?,
        Commands::Cleanup { days } => handler.handle_cleanup_command(days)?,
        Commands::Wipe { yes } => handler.handle_wipe_command(yes)?,
        Commands::Band { .. } => {}
    }

    Ok(())
}
