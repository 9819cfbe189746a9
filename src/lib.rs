pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod normalize;
pub mod scrape;
pub mod services;

pub use config::Config;

use clap::Parser;
use cli::{Cli, Commands, PlanningCommands};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Ingest { urls } => cli::cmd_ingest(&config, &urls).await,

        Commands::IngestFile { path, url } => cli::cmd_ingest_file(&config, &path, &url).await,

        Commands::List(args) => cli::cmd_list(&config, &args).await,

        Commands::Show { sheet_id, json } => cli::cmd_show(&config, sheet_id, json).await,

        Commands::Remove { sheet_id } => cli::cmd_remove(&config, sheet_id).await,

        Commands::Seasons => cli::cmd_seasons(&config).await,

        Commands::Refs { kind } => cli::cmd_refs(&config, kind).await,

        Commands::Planning { command } => match command {
            PlanningCommands::Season { label } => cli::cmd_planning_season(&config, &label).await,
            PlanningCommands::Day { date } => cli::cmd_planning_day(&config, &date).await,
        },

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }
    }
}
