// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! CLI module for the exposure analysis command-line interface.

pub mod args;
pub mod config;
pub mod data_loaders;
pub mod formatters;

pub use args::{AnalyzeArgs, Cli, Commands, ImportPricesArgs, InspectArgs};
pub use config::{apply_overrides, example_toml, load_config};
pub use data_loaders::{
    CachePriceLoader, CsvPriceLoader, PriceLoader, load_price_import, load_production_csv,
    parse_granularity,
};
pub use formatters::TableFormatter;
