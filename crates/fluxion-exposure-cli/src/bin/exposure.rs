// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! CLI entry point for FluxION exposure analysis

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use clap::Parser;
use std::fs;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use fluxion_exposure::analyze;
use fluxion_exposure::normalizer::normalize;
use fluxion_exposure_cli::cli::{
    AnalyzeArgs, CachePriceLoader, Cli, Commands, CsvPriceLoader, ImportPricesArgs, InspectArgs,
    PriceLoader, TableFormatter, apply_overrides, data_loaders::production_window, example_toml,
    load_config, load_price_import, load_production_csv, parse_granularity,
};
use fluxion_exposure_types::{AnalysisConfig, SeriesKind, timezone_for_area};
use fluxion_price_cache::{PriceRepository, SqlitePriceRepository};

fn main() -> Result<()> {
    // Respects RUST_LOG; logs go to stderr so the JSON payload on stdout stays clean
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => inspect_command(&args),
        Commands::Analyze(args) => analyze_command(&args),
        Commands::ImportPrices(args) => import_prices_command(&args),
        Commands::ExampleConfig => {
            print!("{}", example_toml());
            Ok(())
        }
    }
}

fn resolve_timezone(area: &str, timezone: Option<&str>) -> Result<Tz> {
    if let Some(name) = timezone {
        return name.parse::<Tz>().map_err(|_| {
            anyhow::anyhow!("Unknown timezone '{name}'\n\nUse an IANA name such as Europe/Stockholm")
        });
    }
    timezone_for_area(area).with_context(|| {
        format!("Unknown price area '{area}'\n\nPass --timezone to interpret local timestamps")
    })
}

fn inspect_command(args: &InspectArgs) -> Result<()> {
    let tz = resolve_timezone(&args.area, args.timezone.as_deref())?;
    let granularity = args.granularity.as_deref().map(parse_granularity).transpose()?;
    let production = load_production_csv(&args.production, granularity)?;

    let series = normalize(
        SeriesKind::Production,
        &production.samples,
        production.declared_granularity,
        tz,
        1,
    )
    .with_context(|| format!("No usable rows in {}", args.production.display()))?;

    print!("{}", TableFormatter::format_inspection(&series, tz));
    Ok(())
}

fn analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let mut config: AnalysisConfig = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args)?;
    let tz = config.resolve_timezone().with_context(|| {
        format!(
            "Unknown price area '{}'\n\nSet `timezone` in the config file",
            config.area_code
        )
    })?;

    let granularity = args.granularity.as_deref().map(parse_granularity).transpose()?;
    let production = load_production_csv(&args.production, granularity)?;

    let loader: Box<dyn PriceLoader> = if let Some(path) = &args.prices {
        Box::new(CsvPriceLoader::new(path))
    } else if let Some(db) = &args.price_db {
        Box::new(CachePriceLoader::new(db))
    } else {
        bail!("Either --prices or --price-db is required");
    };
    let prices = loader.load(&config.area_code, production_window(&production, tz))?;

    let payload = analyze(&production, &prices, &config).context("Analysis failed")?;
    let json = serde_json::to_string_pretty(&payload).context("Failed to serialize payload")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "Wrote analysis payload");
        }
        None => println!("{json}"),
    }

    eprint!("{}", TableFormatter::format_summary(&payload));
    Ok(())
}

fn import_prices_command(args: &ImportPricesArgs) -> Result<()> {
    let tz = resolve_timezone(&args.area, args.timezone.as_deref())?;
    let series = load_price_import(&args.csv, tz)?;

    let repository = SqlitePriceRepository::new(&args.database);
    let stored = repository
        .store(&args.area, &series.points)
        .with_context(|| format!("Failed to write price database: {}", args.database.display()))?;

    eprintln!(
        "Imported {stored} prices for {} into {}",
        args.area,
        args.database.display()
    );
    if let Some(coverage) = repository.coverage(&args.area)? {
        eprintln!(
            "Database now covers {} .. {} ({} points)",
            coverage.first, coverage.last, coverage.points
        );
    }
    Ok(())
}
