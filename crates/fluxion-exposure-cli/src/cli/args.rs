// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fluxion-exposure")]
#[command(author, version, about = "FluxION negative-price exposure analysis")]
#[command(
    long_about = "Measures how much of a solar producer's export lands in negative or\n\
    low-price hours, and what curtailment or a battery would have changed.\n\
    \nInputs are a production CSV (timestamp,kwh) and day-ahead prices, either\n\
    from a CSV export or from a local price database.\n\
    \nExamples:\n  \
    fluxion-exposure inspect production.csv\n  \
    fluxion-exposure analyze production.csv --prices se3_2024.csv\n  \
    fluxion-exposure analyze production.csv --price-db prices.db --full -o report.json\n  \
    fluxion-exposure import-prices --csv se3_2024.csv --area SE_3"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize a production file and report what was found
    #[command(
        long_about = "Parse and clean a production CSV without running the analysis.\n\
        \nShows row counts, dropped rows, detected granularity, covered range,\n\
        total energy and average energy per day.\n\
        \nExamples:\n  \
        fluxion-exposure inspect production.csv\n  \
        fluxion-exposure inspect daily.csv --granularity daily --area NO_1"
    )]
    Inspect(InspectArgs),

    /// Run the full exposure analysis
    #[command(
        long_about = "Join production with day-ahead prices and compute exposure figures,\n\
        aggregates and curtailment/battery scenarios.\n\
        \nPrice Sources (choose one):\n  \
        - CSV export: --prices <path>\n  \
        - Price database: --price-db <path> (filled with import-prices)\n\
        \nThe JSON payload goes to --output or stdout; a summary table goes to stderr.\n\
        \nExamples:\n  \
        fluxion-exposure analyze production.csv --prices prices.csv\n  \
        fluxion-exposure analyze production.csv --prices prices.csv --config exposure.toml\n  \
        fluxion-exposure analyze production.csv --price-db prices.db --full --sections hero,hourly"
    )]
    Analyze(AnalyzeArgs),

    /// Load a price CSV into the local price database
    #[command(
        long_about = "Import day-ahead prices (timestamp,price per MWh) into a SQLite price database.\n\
        \nExisting hours for the same area are overwritten.\n\
        \nExamples:\n  \
        fluxion-exposure import-prices --csv se3_2024.csv --area SE_3\n  \
        fluxion-exposure import-prices --csv dk1.csv --area DK_1 --database cache.db"
    )]
    ImportPrices(ImportPricesArgs),

    /// Print an example TOML configuration
    ExampleConfig,
}

#[derive(Debug, Parser)]
pub struct InspectArgs {
    /// Production CSV file (timestamp,kwh)
    #[arg(value_name = "PRODUCTION_CSV")]
    pub production: PathBuf,

    /// Bidding zone used to interpret local timestamps
    #[arg(long, default_value = "SE_3", help = "Price area code (e.g. SE_3, DK_1, DE_LU)")]
    pub area: String,

    /// IANA timezone overriding the area's zone
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<String>,

    /// Declared sampling resolution (detected when omitted)
    #[arg(long, value_parser = ["hourly", "15min", "daily"])]
    pub granularity: Option<String>,
}

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Production CSV file (timestamp,kwh)
    #[arg(value_name = "PRODUCTION_CSV")]
    pub production: PathBuf,

    /// Price CSV file (timestamp,price per MWh)
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "price_db",
        required_unless_present = "price_db"
    )]
    pub prices: Option<PathBuf>,

    /// Price database created with import-prices
    #[arg(
        long,
        value_name = "PATH",
        long_help = "Read prices from a SQLite price database.\n\
          Only the range covered by the production file is loaded;\n\
          hours missing from the database are reported and left unmatched."
    )]
    pub price_db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Price area code, overrides the config file
    #[arg(long)]
    pub area: Option<String>,

    /// Target currency code, overrides the config file
    #[arg(long)]
    pub currency: Option<String>,

    /// Target currency units per price currency unit, overrides the config file
    #[arg(long)]
    pub exchange_rate: Option<f64>,

    /// Declared production resolution (detected when omitted)
    #[arg(long, value_parser = ["hourly", "15min", "daily"])]
    pub granularity: Option<String>,

    /// Include hourly records, distributions, extremes and daily buckets
    #[arg(long, default_value_t = false)]
    pub full: bool,

    /// Comma-separated sections to output
    #[arg(
        long,
        value_name = "LIST",
        long_help = "Sections: hero, aggregates, diagnostics, scenarios, meta,\n\
          hourly, distributions, extremes.\n\
          meta and diagnostics are always included.\n\
          \nExample: --sections hero,scenarios"
    )]
    pub sections: Option<String>,

    /// Write the JSON payload here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct ImportPricesArgs {
    /// Price CSV file (timestamp,price per MWh)
    #[arg(long, value_name = "PATH")]
    pub csv: PathBuf,

    /// Price area the file belongs to
    #[arg(long)]
    pub area: String,

    /// Price database (created if it doesn't exist)
    #[arg(long, default_value = "prices.db")]
    pub database: PathBuf,

    /// Timezone for naive timestamps (defaults to the area's zone)
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<String>,
}
