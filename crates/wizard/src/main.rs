mod action;
mod app;
mod cli;
mod components;
mod config;
mod errors;
mod headless;
mod logging;
mod pages;
mod tui;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use farm_records::{FormKind, HttpRecordStore, RecordStore, registry};
use field_gate::prelude::PersistenceAdapter;
use tracing::info;

use crate::app::{App, EditTarget};
use crate::cli::{Cli, Cmd};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    errors::init()?;
    logging::init()?;
    let result = run().await;
    logging::flush();
    result
}

async fn run() -> Result<()> {
    config::ensure_data_and_config_dirs_exist()?;

    let args = Cli::parse();
    let mut config = Config::new()?;
    if let Some(url) = &args.api {
        config.api.base_url = url.clone();
    }
    let store = open_store(&config, args.offline)?;
    info!(
        backend = %store.describe(),
        data_dir = %config.config.data_dir.display(),
        config_dir = %config.config.config_dir.display(),
        "wizard starting"
    );

    match args.cmd.unwrap_or(Cmd::Run { edit_yield: None }) {
        Cmd::Run { edit_yield } => {
            let edit = match edit_yield {
                Some(id) => {
                    let kind = FormKind::YieldRecord;
                    let definition = kind.definition()?;
                    let record = store.get(definition.resource, &id).await?;
                    Some(EditTarget { kind, id, record })
                }
                None => None,
            };
            let mut app = App::new(config, Arc::new(store), edit)?;
            app.run().await?;
        }
        Cmd::Submit {
            form,
            values,
            id,
            yes,
        } => headless::submit(store, form, &values, id, yes).await?,
        Cmd::Stock { item } => headless::stock(store, &item).await?,
        Cmd::Forms => headless::list_forms(&registry()?),
    }
    Ok(())
}

fn open_store(config: &Config, offline: bool) -> Result<RecordStore> {
    if offline {
        return Ok(RecordStore::offline());
    }
    let http = HttpRecordStore::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?;
    Ok(RecordStore::Http(http))
}
