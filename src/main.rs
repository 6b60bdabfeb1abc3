use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use weather_monitor_lib::{config::MonitorConfig, current_observations, daily_summaries, db::Database};

#[derive(Parser)]
#[command(name = "weather-monitor", about = "Polls city weather and keeps daily summaries")]
struct Cli {
    /// JSON config file; defaults are used when it does not exist
    #[arg(long, env = "WEATHER_MONITOR_CONFIG", default_value = "weather-monitor.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sample every configured city until Ctrl-C (default)
    Run,
    /// Print the latest observation for every city as JSON
    Show,
    /// Print stored daily summaries for one city as JSON
    Summary {
        #[arg(long)]
        city: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    weather_monitor_lib::init_logging();

    let cli = Cli::parse();
    let config = MonitorConfig::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => weather_monitor_lib::run(config).await,
        Command::Show => {
            let db = Database::new(config.database_path)?;
            let views = current_observations(&db).await?;
            println!("{}", serde_json::to_string_pretty(&views)?);
            Ok(())
        }
        Command::Summary { city } => {
            let db = Database::new(config.database_path)?;
            let summaries = daily_summaries(&db, &city).await?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            Ok(())
        }
    }
}
