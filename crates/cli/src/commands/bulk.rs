//! Bulk sizing command

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use sizer_lib::{
    bulk::{self, BulkParse},
    report::{write_csv, write_summary_csv},
    BatchReport, SizingEngine, WorkloadReport,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tabled::Tabled;
use tracing::debug;

use crate::client::{ApiClient, BatchPayload};
use crate::output::{
    color_score, format_currency, print_info, print_json, print_success, print_table,
    print_warning, ExportFormat, OutputFormat,
};

#[derive(Tabled, Serialize)]
struct DatabaseRow {
    #[tabled(rename = "Database")]
    name: String,
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "PROD Instance")]
    instance_type: String,
    #[tabled(rename = "PROD Monthly")]
    prod_monthly: String,
    #[tabled(rename = "All Envs Monthly")]
    total_monthly: String,
    #[tabled(rename = "Optimization")]
    optimization: String,
}

impl From<&WorkloadReport> for DatabaseRow {
    fn from(report: &WorkloadReport) -> Self {
        let prod = report.analysis.prod();
        Self {
            name: report.name.clone(),
            engine: report.spec.engine.to_string(),
            region: report.spec.region.to_string(),
            instance_type: prod
                .map(|p| p.instance_type.clone())
                .unwrap_or_else(|| "-".to_string()),
            prod_monthly: prod
                .map(|p| format_currency(p.monthly_cost))
                .unwrap_or_else(|| "-".to_string()),
            total_monthly: format_currency(report.analysis.total_monthly_cost),
            optimization: prod
                .map(|p| color_score(p.optimization_score))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Size every workload in a CSV or JSON file
pub async fn run(
    file: &Path,
    export: Option<ExportFormat>,
    output: Option<&Path>,
    client: Option<&ApiClient>,
    format: OutputFormat,
) -> Result<()> {
    let BulkParse { records, errors } = bulk::parse_path(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    for error in &errors {
        print_warning(&error.to_string());
    }

    if records.is_empty() {
        anyhow::bail!("No valid databases found in {}", file.display());
    }

    debug!(accepted = records.len(), rejected = errors.len(), "Parsed bulk input");

    let report: BatchReport = match client {
        Some(client) => {
            client
                .post("api/v1/sizing/batch", &BatchPayload { databases: &records })
                .await?
        }
        None => BatchReport::new(SizingEngine::default().analyze_batch(&records)),
    };

    match export {
        Some(export) => write_export(&report, export, output),
        None => {
            print_report(&report, format)?;
            Ok(())
        }
    }
}

fn write_export(report: &BatchReport, export: ExportFormat, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_to(report, export, BufWriter::new(file))?;
            print_success(&format!(
                "Exported {} databases to {}",
                report.databases.len(),
                path.display()
            ));
        }
        None => write_to(report, export, io::stdout().lock())?,
    }
    Ok(())
}

fn write_to<W: Write>(report: &BatchReport, export: ExportFormat, mut writer: W) -> Result<()> {
    match export {
        ExportFormat::Csv => write_csv(report, writer)?,
        ExportFormat::SummaryCsv => write_summary_csv(report, writer)?,
        ExportFormat::Json => {
            writeln!(writer, "{}", report.to_json()?)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn print_report(report: &BatchReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    let rows: Vec<DatabaseRow> = report.databases.iter().map(DatabaseRow::from).collect();
    print_table(&rows, format);

    let summary = &report.summary;
    println!();
    println!("{}", "Fleet summary".bold());
    println!("  Databases:              {}", summary.database_count);
    println!(
        "  PROD monthly:           {}",
        format_currency(summary.total_prod_monthly_cost).green().bold()
    );
    println!(
        "  PROD annual:            {}",
        format_currency(summary.total_prod_annual_cost)
    );
    println!(
        "  All environments:       {}/month",
        format_currency(summary.total_monthly_cost_all_envs)
    );
    println!(
        "  On-premise estimate:    {}/month",
        format_currency(summary.estimated_onprem_monthly)
    );
    if let Some(score) = summary.average_prod_optimization_score {
        println!("  Avg PROD optimization:  {:.0}%", score);
    }

    println!();
    print_info("Use --export csv, summary-csv or json to save the full report");
    Ok(())
}
