pub mod cli;
pub mod core;
pub mod providers;
pub mod service;
pub mod store;

use crate::cli::currency::CurrencyChoice;
use crate::core::cache::PREFERENCES_COLLECTION;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyCode;
use crate::core::leads::Lead;
use crate::core::tips::Property;
use crate::providers::RatesFunctionProvider;
use crate::service::{CurrencyService, REFRESH_INTERVAL};
use crate::store::KeyValueStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Commands that run against a loaded configuration.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Rates {
        watch: bool,
    },
    Convert {
        amount_idr: f64,
        to: Option<CurrencyCode>,
        short: bool,
    },
    Currency(CurrencyChoice),
    Tips(PathBuf),
    Leads(PathBuf),
}

fn open_store(config: &AppConfig) -> KeyValueStore {
    match config.default_data_path() {
        Ok(data_dir) => {
            debug!("Opening storage under {}", data_dir.display());
            KeyValueStore::open(&data_dir)
        }
        Err(e) => {
            warn!("No data directory available, nothing will be remembered: {e:#}");
            KeyValueStore::in_memory()
        }
    }
}

/// Builds the currency service for `config` with its persisted state loaded
/// and the automatic currency applied.
pub async fn build_service(config: &AppConfig) -> Result<CurrencyService> {
    let store = open_store(config);
    let storage = store.collection_or_memory(PREFERENCES_COLLECTION);
    let provider = RatesFunctionProvider::new(&config.rates)?;

    let service = CurrencyService::new(storage, Arc::new(provider));
    service.load_persisted().await;
    let code = match config.currency {
        Some(pinned) => service.apply_automatic(pinned),
        None => service.apply_language(&config.language),
    };
    debug!(%code, manual = service.selection().manual, "Display currency resolved");
    Ok(service)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("hunian starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Tips(path) => {
            let properties: Vec<Property> = cli::load_records(&path)?;
            cli::tips::run(&properties)
        }
        AppCommand::Rates { watch } => {
            let service = build_service(&config).await?;
            if watch {
                cli::rates::watch(&service, REFRESH_INTERVAL).await
            } else {
                cli::rates::run(&service).await
            }
        }
        AppCommand::Convert {
            amount_idr,
            to,
            short,
        } => {
            let service = build_service(&config).await?;
            cli::rates::refresh_with_spinner(&service).await;
            cli::convert::run(&service, amount_idr, to, short)
        }
        AppCommand::Currency(choice) => {
            let service = build_service(&config).await?;
            cli::currency::run(&service, choice, &config.language).await
        }
        AppCommand::Leads(path) => {
            let leads: Vec<Lead> = cli::load_records(&path)?;
            let service = build_service(&config).await?;
            cli::rates::refresh_with_spinner(&service).await;
            cli::leads::run(&leads, &service)
        }
    }
}
