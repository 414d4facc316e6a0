//! Single-workload sizing command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use sizer_lib::{
    CostProjection, Engine, Environment, Region, SizingEngine, WorkloadAnalysis, WorkloadSpec,
};
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, SizingPayload};
use crate::config::Config;
use crate::output::{color_environment, color_score, format_currency, print_json, OutputFormat};

/// Years covered by the on-premise comparison
const PROJECTION_YEARS: u32 = 3;

#[derive(Debug, Args)]
pub struct SizeArgs {
    /// Database engine (oracle-ee, oracle-se, postgres, aurora-postgresql, aurora-mysql, sqlserver)
    #[arg(long)]
    pub engine: Option<Engine>,

    /// Region code, e.g. us-east-1
    #[arg(long)]
    pub region: Option<Region>,

    /// Currently provisioned CPU cores
    #[arg(long)]
    pub cores: u32,

    /// Peak CPU utilization in percent
    #[arg(long)]
    pub cpu_util: u32,

    /// Provisioned RAM in GB
    #[arg(long)]
    pub ram: u32,

    /// Peak RAM utilization in percent
    #[arg(long)]
    pub ram_util: u32,

    /// Provisioned storage in GB
    #[arg(long)]
    pub storage: u32,

    /// Provisioned IOPS
    #[arg(long)]
    pub iops: Option<u32>,

    /// Annual data growth in percent
    #[arg(long)]
    pub growth: Option<f64>,

    /// Backup retention in days (1-35)
    #[arg(long)]
    pub backup_days: Option<u32>,

    /// Outbound data transfer in GB per month
    #[arg(long)]
    pub data_transfer: Option<u32>,

    /// Environments to size (repeatable); all when omitted
    #[arg(long = "env")]
    pub environments: Vec<Environment>,
}

impl SizeArgs {
    fn to_spec(&self, config: &Config) -> Result<WorkloadSpec> {
        let engine = self
            .engine
            .or(config.default_engine)
            .context("--engine is required (or set default_engine in the config file)")?;
        let region = self
            .region
            .or(config.default_region)
            .context("--region is required (or set default_region in the config file)")?;

        let mut builder = WorkloadSpec::builder()
            .engine(engine)
            .region(region)
            .cores(self.cores)
            .cpu_util_pct(self.cpu_util)
            .ram_gb(self.ram)
            .ram_util_pct(self.ram_util)
            .storage_gb(self.storage);

        if let Some(iops) = self.iops {
            builder = builder.iops(iops);
        }
        if let Some(growth) = self.growth {
            builder = builder.growth_pct_annual(growth);
        }
        if let Some(days) = self.backup_days {
            builder = builder.backup_retention_days(days);
        }
        if let Some(gb) = self.data_transfer {
            builder = builder.data_transfer_gb_month(gb);
        }

        Ok(builder.build()?)
    }
}

#[derive(Tabled, Serialize)]
struct EnvironmentRow {
    #[tabled(rename = "Environment")]
    environment: String,
    #[tabled(rename = "Instance")]
    instance_type: String,
    #[tabled(rename = "vCPUs")]
    vcpus: u32,
    #[tabled(rename = "RAM (GB)")]
    ram_gb: u32,
    #[tabled(rename = "Storage (GB)")]
    storage_gb: u32,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
    #[tabled(rename = "Optimization")]
    optimization: String,
}

#[derive(Tabled)]
struct CostRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
}

#[derive(Tabled)]
struct ProjectionRow {
    #[tabled(rename = "Year")]
    year: u32,
    #[tabled(rename = "On-Premise")]
    onprem: String,
    #[tabled(rename = "Cloud")]
    cloud: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

#[derive(Serialize)]
struct SizeOutput<'a> {
    spec: &'a WorkloadSpec,
    analysis: &'a WorkloadAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<CostProjection>,
}

/// Size a workload locally or through the API
pub async fn run(
    args: SizeArgs,
    client: Option<&ApiClient>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let spec = args.to_spec(config)?;
    let environments = if args.environments.is_empty() {
        Environment::ALL.to_vec()
    } else {
        args.environments.clone()
    };

    let analysis: WorkloadAnalysis = match client {
        Some(client) => {
            let body = SizingPayload {
                spec: &spec,
                environments: &environments,
            };
            client.post("api/v1/sizing", &body).await?
        }
        None => SizingEngine::default().analyze_environments(&spec, &environments),
    };

    let projection = analysis
        .prod()
        .map(|prod| CostProjection::new(&spec, prod, PROJECTION_YEARS));

    match format {
        OutputFormat::Json => print_json(&SizeOutput {
            spec: &spec,
            analysis: &analysis,
            projection,
        })?,
        OutputFormat::Table => print_tables(&spec, &analysis, projection.as_ref()),
    }

    Ok(())
}

fn print_tables(spec: &WorkloadSpec, analysis: &WorkloadAnalysis, projection: Option<&CostProjection>) {
    println!(
        "{} {} in {}",
        "Sizing".bold(),
        spec.engine.to_string().cyan(),
        spec.region.to_string().cyan()
    );
    println!(
        "Observed: {} cores @ {}%, {} GB RAM @ {}%, {} GB storage, {} IOPS",
        spec.cores, spec.cpu_util_pct, spec.ram_gb, spec.ram_util_pct, spec.storage_gb, spec.iops
    );
    println!();

    let rows: Vec<EnvironmentRow> = analysis
        .results
        .iter()
        .map(|r| EnvironmentRow {
            environment: color_environment(r.environment),
            instance_type: r.instance_type.clone(),
            vcpus: r.vcpus,
            ram_gb: r.ram_gb,
            storage_gb: r.storage_gb,
            monthly: format_currency(r.monthly_cost),
            annual: format_currency(r.annual_cost),
            optimization: color_score(r.optimization_score),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    println!(
        "{} {}/month, {}/year",
        "Total across environments:".bold(),
        format_currency(analysis.total_monthly_cost).green().bold(),
        format_currency(analysis.total_annual_cost)
    );

    if let Some(prod) = analysis.prod() {
        println!();
        println!("{}", "PROD cost breakdown".bold());
        let mut rows: Vec<CostRow> = prod
            .cost_breakdown
            .components()
            .iter()
            .map(|(name, value)| CostRow {
                component: name.replace('_', " "),
                monthly: format_currency(*value),
            })
            .collect();
        rows.push(CostRow {
            component: "total".bold().to_string(),
            monthly: format_currency(prod.cost_breakdown.total).bold().to_string(),
        });
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if let Some(projection) = projection {
        println!();
        println!("{}", "On-premise comparison".bold());
        let savings = format_currency(projection.monthly_savings);
        let savings = if projection.monthly_savings >= 0.0 {
            savings.green()
        } else {
            savings.red()
        };
        match projection.savings_pct {
            Some(pct) => println!(
                "On-premise estimate {}/month, savings {}/month ({:.0}%)",
                format_currency(projection.onprem_monthly),
                savings,
                pct
            ),
            None => println!(
                "On-premise estimate {}/month, savings {}/month",
                format_currency(projection.onprem_monthly),
                savings
            ),
        }

        let rows: Vec<ProjectionRow> = projection
            .years
            .iter()
            .map(|y| ProjectionRow {
                year: y.year,
                onprem: format_currency(y.onprem_annual),
                cloud: format_currency(y.cloud_annual),
                savings: format_currency(y.savings),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
}
