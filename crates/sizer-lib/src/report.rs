//! Sizing reports
//!
//! Bundles sizing results per workload and per batch, renders them as JSON
//! or CSV, and projects cloud cost against an on-premise estimate.

use crate::insights::{annotate, Annotation};
use crate::models::{Environment, NamedWorkload, SizingResult, WorkloadAnalysis, WorkloadSpec};
use crate::validation::PROJECTION_YEARS_RANGE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Estimated on-premise cost per provisioned core per month (USD)
pub const ONPREM_MONTHLY_PER_CORE: f64 = 200.0;

/// Share of the workload growth rate that cloud spend grows by
pub const CLOUD_GROWTH_SHARE: f64 = 0.7;

/// Projected cost for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    pub onprem_annual: f64,
    pub cloud_annual: f64,
    pub savings: f64,
}

/// Cloud PROD cost compared with an estimated on-premise cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostProjection {
    pub onprem_monthly: f64,
    pub cloud_monthly: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    /// Savings as a percentage of on-premise cost; None without an estimate
    pub savings_pct: Option<f64>,
    pub years: Vec<YearProjection>,
}

impl CostProjection {
    /// `years` is capped at the end of [`PROJECTION_YEARS_RANGE`]
    pub fn new(spec: &WorkloadSpec, prod: &SizingResult, years: u32) -> Self {
        let onprem_monthly = f64::from(spec.cores) * ONPREM_MONTHLY_PER_CORE;
        let cloud_monthly = prod.monthly_cost;
        let monthly_savings = onprem_monthly - cloud_monthly;
        let growth = spec.growth_pct_annual / 100.0;

        let horizon = years.min(*PROJECTION_YEARS_RANGE.end());

        let years = (1..=horizon)
            .map(|year| {
                let exponent = year as i32 - 1;
                let onprem_annual = onprem_monthly * 12.0 * (1.0 + growth).powi(exponent);
                let cloud_annual =
                    cloud_monthly * 12.0 * (1.0 + growth * CLOUD_GROWTH_SHARE).powi(exponent);
                YearProjection {
                    year,
                    onprem_annual,
                    cloud_annual,
                    savings: onprem_annual - cloud_annual,
                }
            })
            .collect();

        Self {
            onprem_monthly,
            cloud_monthly,
            monthly_savings,
            annual_savings: monthly_savings * 12.0,
            savings_pct: (onprem_monthly > 0.0).then(|| monthly_savings / onprem_monthly * 100.0),
            years,
        }
    }
}

/// Everything produced for one named workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub name: String,
    pub spec: WorkloadSpec,
    pub analysis: WorkloadAnalysis,
    /// Present whenever PROD was sized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<CostProjection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Annotation>,
}

impl WorkloadReport {
    /// Build the report; workload notes, when present, are annotated
    pub fn new(workload: NamedWorkload, analysis: WorkloadAnalysis) -> Self {
        let projection = analysis
            .prod()
            .map(|prod| CostProjection::new(&workload.spec, prod, workload.projection_years));
        let report = Self {
            name: workload.name,
            spec: workload.spec,
            analysis,
            projection,
            narrative: None,
        };
        match workload.notes.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => report.with_narrative(annotate(text)),
            _ => report,
        }
    }

    pub fn with_narrative(mut self, narrative: Annotation) -> Self {
        self.narrative = Some(narrative);
        self
    }
}

/// Fleet-wide totals of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub database_count: usize,
    pub total_prod_monthly_cost: f64,
    pub total_prod_annual_cost: f64,
    pub total_monthly_cost_all_envs: f64,
    pub estimated_onprem_monthly: f64,
    /// None for an empty batch
    pub average_prod_optimization_score: Option<f64>,
}

impl BatchSummary {
    pub fn from_reports(reports: &[WorkloadReport]) -> Self {
        let prods: Vec<&SizingResult> = reports.iter().filter_map(|r| r.analysis.prod()).collect();
        let average_prod_optimization_score = if prods.is_empty() {
            None
        } else {
            let total: f64 = prods.iter().map(|p| f64::from(p.optimization_score)).sum();
            Some(total / prods.len() as f64)
        };

        Self {
            database_count: reports.len(),
            total_prod_monthly_cost: prods.iter().map(|p| p.monthly_cost).sum(),
            total_prod_annual_cost: prods.iter().map(|p| p.annual_cost).sum(),
            total_monthly_cost_all_envs: reports
                .iter()
                .map(|r| r.analysis.total_monthly_cost)
                .sum(),
            estimated_onprem_monthly: reports
                .iter()
                .map(|r| f64::from(r.spec.cores) * ONPREM_MONTHLY_PER_CORE)
                .sum(),
            average_prod_optimization_score,
        }
    }
}

/// Result of sizing a fleet of databases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub databases: Vec<WorkloadReport>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(databases: Vec<WorkloadReport>) -> Self {
        let summary = BatchSummary::from_reports(&databases);
        Self {
            generated_at: Utc::now(),
            databases,
            summary,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

const DETAIL_HEADER: [&str; 10] = [
    "Database",
    "Engine",
    "Environment",
    "Instance Type",
    "vCPUs",
    "RAM (GB)",
    "Storage (GB)",
    "Monthly Cost",
    "Annual Cost",
    "Optimization",
];

const SUMMARY_HEADER: [&str; 9] = [
    "Database",
    "Engine",
    "Instance Type",
    "vCPUs",
    "RAM (GB)",
    "Storage (GB)",
    "Monthly Cost",
    "Annual Cost",
    "Optimization",
];

fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// One row per database and environment
pub fn write_csv<W: Write>(report: &BatchReport, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(DETAIL_HEADER)?;

    for database in &report.databases {
        for result in &database.analysis.results {
            csv_writer.write_record([
                database.name.clone(),
                database.spec.engine.to_string(),
                result.environment.to_string(),
                result.instance_type.clone(),
                result.vcpus.to_string(),
                result.ram_gb.to_string(),
                result.storage_gb.to_string(),
                money(result.monthly_cost),
                money(result.annual_cost),
                format!("{}%", result.optimization_score),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Executive summary: the PROD recommendation of every database
pub fn write_summary_csv<W: Write>(report: &BatchReport, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(SUMMARY_HEADER)?;

    for database in &report.databases {
        let Some(prod) = database.analysis.get(Environment::Prod) else {
            continue;
        };
        csv_writer.write_record([
            database.name.clone(),
            database.spec.engine.to_string(),
            prod.instance_type.clone(),
            prod.vcpus.to_string(),
            prod.ram_gb.to_string(),
            prod.storage_gb.to_string(),
            money(prod.monthly_cost),
            money(prod.annual_cost),
            format!("{}%", prod.optimization_score),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
