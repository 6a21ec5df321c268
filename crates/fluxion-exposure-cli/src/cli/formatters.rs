// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Output formatters for CLI results.

use chrono::NaiveDate;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use std::collections::BTreeSet;
use std::fmt::Write;

use fluxion_exposure::clock::local_date;
use fluxion_exposure_types::{AnalysisPayload, Granularity, NormalizedSeries};

/// Formatter for pretty tables
#[derive(Debug)]
pub struct TableFormatter;

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.decimals$}"))
}

impl TableFormatter {
    /// Summarize a normalized production series
    #[must_use]
    pub fn format_inspection(series: &NormalizedSeries, tz: Tz) -> String {
        let report = &series.report;
        let days: BTreeSet<NaiveDate> = series
            .points
            .iter()
            .map(|p| local_date(p.timestamp, tz))
            .collect();
        let total = series.total();
        #[expect(clippy::cast_precision_loss)]
        let per_day = (!days.is_empty()).then(|| total / days.len() as f64);

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&["Property", "Value"]));

        let granularity = match report.declared_granularity {
            Some(declared) => format!("{declared} (declared, detected {})", report.inferred_granularity),
            None => format!("{} (detected)", report.inferred_granularity),
        };
        let range = match (series.first(), series.last()) {
            (Some(first), Some(last)) => format!(
                "{} .. {}",
                first.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                last.with_timezone(&tz).format("%Y-%m-%d %H:%M")
            ),
            _ => "-".to_owned(),
        };

        table.add_row(vec![Cell::new("Rows read"), Cell::new(report.rows_in)]);
        table.add_row(vec![Cell::new("Rows kept"), Cell::new(report.rows_out)]);
        table.add_row(vec![
            Cell::new("Invalid rows dropped"),
            Cell::new(report.invalid_rows_dropped),
        ]);
        table.add_row(vec![
            Cell::new("Duplicates resolved"),
            Cell::new(report.duplicates_dropped),
        ]);
        table.add_row(vec![Cell::new("Granularity"), Cell::new(granularity)]);
        table.add_row(vec![
            Cell::new("Modal gap (min)"),
            Cell::new(report.modal_gap_minutes.map_or_else(|| "-".to_owned(), |g| g.to_string())),
        ]);
        table.add_row(vec![Cell::new(format!("Range ({tz})")), Cell::new(range)]);
        table.add_row(vec![Cell::new("Days"), Cell::new(days.len())]);
        table.add_row(vec![
            Cell::new("Total (kWh)"),
            Cell::new(format!("{total:.2}")),
        ]);
        table.add_row(vec![
            Cell::new("Average per day (kWh)"),
            Cell::new(optional(per_day, 2)),
        ]);

        let mut output = table.to_string();
        output.push('\n');
        if series.granularity == Granularity::Daily {
            output.push_str("Daily totals: hourly figures will be estimated with a solar shape\n");
        }
        output
    }

    /// Headline figures, battery grid and diagnostics of an analysis
    #[must_use]
    pub fn format_summary(payload: &AnalysisPayload) -> String {
        let meta = &payload.meta;
        let currency = &meta.currency;
        let mut output = String::new();

        if let Some(hero) = &payload.hero {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(header(&["Metric", "Value"]));

            let period = match (hero.period_start, hero.period_end) {
                (Some(start), Some(end)) => format!("{start} .. {end} ({} days)", hero.days),
                _ => "-".to_owned(),
            };
            table.add_row(vec![Cell::new("Period"), Cell::new(period)]);
            table.add_row(vec![
                Cell::new("Production (kWh)"),
                Cell::new(format!("{:.1}", hero.total_production_kwh)),
            ]);
            table.add_row(vec![
                Cell::new(format!("Revenue ({currency})")),
                Cell::new(format!("{:.2}", hero.total_revenue)),
            ]);
            let negative_hours = format!(
                "{} of {} ({:.1}%)",
                hero.hours_negative, hero.hours_total, hero.negative_hours_pct
            );
            let negative_hours_cell = if hero.hours_negative > 0 {
                Cell::new(negative_hours).fg(Color::Red)
            } else {
                Cell::new(negative_hours)
            };
            table.add_row(vec![Cell::new("Negative-price hours"), negative_hours_cell]);
            table.add_row(vec![
                Cell::new("Exported at negative price (kWh)"),
                Cell::new(format!(
                    "{:.1} ({:.1}%)",
                    hero.negative_kwh, hero.negative_production_pct
                )),
            ]);
            table.add_row(vec![
                Cell::new(format!("Cost of negative hours ({currency})")),
                Cell::new(format!("{:.2}", hero.negative_cost)),
            ]);
            if hero.hours_negative > 0 {
                table.add_row(vec![
                    Cell::new(format!("Negative price avg / min ({currency}/kWh)")),
                    Cell::new(format!(
                        "{} / {}",
                        optional(hero.avg_negative_price, 4),
                        optional(hero.min_negative_price, 4)
                    )),
                ]);
                table.add_row(vec![
                    Cell::new("Avg output in negative hours (kWh)"),
                    Cell::new(optional(hero.avg_production_during_negative_prices, 2)),
                ]);
            }
            table.add_row(vec![
                Cell::new(format!("Average price ({currency}/kWh)")),
                Cell::new(optional(hero.price_simple_avg, 4)),
            ]);
            table.add_row(vec![
                Cell::new(format!("Capture price ({currency}/kWh)")),
                Cell::new(optional(hero.price_weighted_avg, 4)),
            ]);
            table.add_row(vec![
                Cell::new("Timing loss (%)"),
                Cell::new(optional(hero.timing_loss_pct, 1)),
            ]);
            if let Some(fee_revenue) = hero.fee_inclusive_revenue {
                table.add_row(vec![
                    Cell::new(format!("Revenue incl. fees ({currency})")),
                    Cell::new(format!("{fee_revenue:.2}")),
                ]);
            }

            output.push_str(&table.to_string());
            output.push('\n');
        }

        if let Some(scenarios) = &payload.scenarios {
            let curtailment = &scenarios.curtailment;
            let _ = writeln!(
                output,
                "Curtailment: {} hours, {:.1} kWh, avoided cost {:.2} {currency} (uplift {}%)",
                curtailment.curtailed_hours,
                curtailment.curtailed_kwh,
                curtailment.avoided_cost,
                optional(curtailment.uplift_pct, 1)
            );

            if !scenarios.battery.is_empty() {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(header(&[
                    "Battery\n(kWh)",
                    "Power\n(kW)",
                    "Revenue",
                    "Delta",
                    "Charged\n(kWh)",
                    "Cycles",
                ]));

                for result in &scenarios.battery {
                    let is_best = scenarios.best_battery.as_ref().is_some_and(|best| {
                        best.capacity_kwh.total_cmp(&result.capacity_kwh).is_eq()
                            && best.delta > 0.0
                    });
                    let capacity = Cell::new(format!("{:.1}", result.capacity_kwh));
                    let capacity = if is_best {
                        capacity.fg(Color::Green).add_attribute(Attribute::Bold)
                    } else {
                        capacity
                    };

                    table.add_row(vec![
                        capacity,
                        Cell::new(format!("{:.1}", result.power_kw)),
                        Cell::new(format!("{:.2}", result.simulated_revenue)),
                        Cell::new(format!("{:+.2}", result.delta)),
                        Cell::new(format!("{:.1}", result.charged_kwh)),
                        Cell::new(format!("{:.1}", result.equivalent_cycles)),
                    ]);
                }

                output.push_str(&table.to_string());
                output.push('\n');
                let _ = writeln!(output, "Battery decisions on {} prices", scenarios.decision_basis);
            }
        }

        let diagnostics = &payload.diagnostics;
        let _ = writeln!(
            output,
            "Area: {} ({}) | Production: {}{} | Match rate: {:.1}% | Engine {}",
            meta.area_code,
            meta.timezone,
            meta.production_granularity,
            if meta.daily_approximation {
                " (estimated hours)"
            } else {
                ""
            },
            meta.match_rate * 100.0,
            meta.engine_version
        );
        if diagnostics.has_warnings() {
            let _ = writeln!(output, "Warnings:");
            for warning in &diagnostics.warnings {
                let _ = writeln!(output, "  - {warning}");
            }
        }

        output
    }
}
