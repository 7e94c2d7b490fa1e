use std::io::{self, Write};

use clap::ValueEnum;
use tabled::{Table, builder::Builder};

use crate::api::CalculateResponse;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

pub(crate) fn write_report<W: Write>(
    format: OutputFormat,
    response: &CalculateResponse,
    out: W,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => write_table(response, out),
        OutputFormat::Csv => write_csv(response, out),
        OutputFormat::Json => write_json(response, out),
    }
}

/// Formats a dollar amount with thousands separators and two decimals,
/// e.g. `-$1,234.50`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.2}", value.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

fn write_table<W: Write>(response: &CalculateResponse, mut out: W) -> io::Result<()> {
    let summary = &response.summary;
    writeln!(out, "Final Amount: {}", format_currency(summary.final_amount))?;
    writeln!(
        out,
        "Total Money Invested: {}",
        format_currency(summary.total_invested)
    )?;
    writeln!(
        out,
        "Total Profit Made: {}",
        format_currency(summary.total_profit)
    )?;

    let Some(series) = &response.series else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(
        out,
        "Compounding {} / contributions {} at {} ({} base periods per year)",
        response.compounding_frequency,
        response.contribution_frequency,
        response.contribute_at.label(),
        response.base_frequency
    )?;

    let mut builder = Builder::default();
    builder.push_record(["Year", "Portfolio Value", "Total Invested"]);
    let per_year = u64::from(response.base_frequency);
    for point in series.iter().filter(|p| p.step % per_year == 0) {
        builder.push_record([
            (point.step / per_year).to_string(),
            format_currency(point.portfolio_value),
            format_currency(point.baseline_value),
        ]);
    }
    writeln!(out, "{}", Table::from(builder))
}

fn write_csv<W: Write>(response: &CalculateResponse, out: W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    match &response.series {
        Some(series) => {
            wtr.write_record(["time_years", "portfolio_value", "baseline_value"])?;
            for point in series {
                wtr.write_record([
                    point.time_years.to_string(),
                    point.portfolio_value.to_string(),
                    point.baseline_value.to_string(),
                ])?;
            }
        }
        None => {
            let summary = &response.summary;
            wtr.write_record(["field", "value"])?;
            wtr.write_record(["final_amount", summary.final_amount.to_string().as_str()])?;
            wtr.write_record(["total_invested", summary.total_invested.to_string().as_str()])?;
            wtr.write_record(["total_profit", summary.total_profit.to_string().as_str()])?;
        }
    }

    wtr.flush()
}

fn write_json<W: Write>(response: &CalculateResponse, mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, response)?;
    writeln!(out)
}
