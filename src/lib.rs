pub mod cli;
pub mod config;
pub mod database;
pub mod docserver;
pub mod domain;
pub mod http;
pub mod scoring;
pub mod services;
pub mod store;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use log::info;
use std::path::PathBuf;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::services::migration::MigrationService;
use crate::services::report::{render_scoreboard, render_tournament_list};
use crate::services::server::ServerService;
use crate::store::{load_scoreboard, open_store};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve_docs(port: u16, database: Option<String>) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    config.docserver.port = port;
    if let Some(path) = database {
        config.docserver.database_path = path;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let service = ServerService::new(config.docserver);
        service.run().await
    })
}

pub fn handle_list() -> Result<()> {
    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(print_tournament_list(&config))
}

async fn print_tournament_list(config: &AppConfig) -> Result<()> {
    let store = open_store(&config.store)?;
    let tournaments = store.list_tournaments().await?;
    print!("{}", render_tournament_list(&tournaments));
    Ok(())
}

pub fn handle_scoreboard(id: &str) -> Result<()> {
    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(print_scoreboard(&config, id))
}

async fn print_scoreboard(config: &AppConfig, id: &str) -> Result<()> {
    let store = open_store(&config.store)?;
    let scoreboard = load_scoreboard(store.as_ref(), id).await?;
    print!("{}", render_scoreboard(&scoreboard));
    Ok(())
}

pub fn handle_migrate(data_dir: Option<PathBuf>, remote_url: Option<String>) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(dir) = data_dir {
        config.store.data_dir = dir;
    }
    if let Some(url) = remote_url {
        config.store.remote.base_url = url;
    }
    info!(
        "Migrating {} into {}",
        config.store.data_dir.display(),
        config.store.remote.base_url
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_migration(&config))
}

async fn run_migration(config: &AppConfig) -> Result<()> {
    let service = MigrationService::from_settings(&config.store)?;
    let report = service.run().await?;
    println!("{}", report.summary());
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
