//! Core data models for the sizing advisor

use crate::error::SpecError;
use crate::validation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default provisioned IOPS when a workload does not state one
pub const DEFAULT_IOPS: u32 = 3000;

/// Default backup retention in days
pub const DEFAULT_BACKUP_RETENTION_DAYS: u32 = 7;

/// Default monthly outbound data transfer in GB
pub const DEFAULT_DATA_TRANSFER_GB: u32 = 100;

/// Managed database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    OracleEe,
    OracleSe,
    Postgres,
    AuroraPostgresql,
    AuroraMysql,
    Sqlserver,
}

impl Engine {
    pub const ALL: [Engine; 6] = [
        Engine::OracleEe,
        Engine::OracleSe,
        Engine::Postgres,
        Engine::AuroraPostgresql,
        Engine::AuroraMysql,
        Engine::Sqlserver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::OracleEe => "oracle-ee",
            Engine::OracleSe => "oracle-se",
            Engine::Postgres => "postgres",
            Engine::AuroraPostgresql => "aurora-postgresql",
            Engine::AuroraMysql => "aurora-mysql",
            Engine::Sqlserver => "sqlserver",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Engine::ALL
            .into_iter()
            .find(|engine| engine.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SpecError::UnknownEngine(wanted.to_string()))
    }
}

/// Supported deployment region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "us-east-1")]
    UsEast1,
    #[serde(rename = "us-west-1")]
    UsWest1,
    #[serde(rename = "us-west-2")]
    UsWest2,
    #[serde(rename = "eu-west-1")]
    EuWest1,
    #[serde(rename = "ap-southeast-1")]
    ApSoutheast1,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::UsEast1,
        Region::UsWest1,
        Region::UsWest2,
        Region::EuWest1,
        Region::ApSoutheast1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::UsEast1 => "us-east-1",
            Region::UsWest1 => "us-west-1",
            Region::UsWest2 => "us-west-2",
            Region::EuWest1 => "eu-west-1",
            Region::ApSoutheast1 => "ap-southeast-1",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Region::ALL
            .into_iter()
            .find(|region| region.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SpecError::UnknownRegion(wanted.to_string()))
    }
}

/// Deployment tier a recommendation is produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Prod,
    Staging,
    Qa,
    Dev,
}

/// Fixed scaling profile of an environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentProfile {
    /// Multiplier applied to utilized CPU and RAM
    pub cpu_factor: f64,
    /// Multiplier applied to provisioned storage
    pub storage_factor: f64,
    /// Descriptive only; PROD cost doubling does not consult it
    pub ha_required: bool,
}

impl Environment {
    /// All environments in report order
    pub const ALL: [Environment; 4] = [
        Environment::Prod,
        Environment::Staging,
        Environment::Qa,
        Environment::Dev,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "PROD",
            Environment::Staging => "STAGING",
            Environment::Qa => "QA",
            Environment::Dev => "DEV",
        }
    }

    pub fn profile(&self) -> EnvironmentProfile {
        match self {
            Environment::Prod => EnvironmentProfile {
                cpu_factor: 1.0,
                storage_factor: 1.0,
                ha_required: true,
            },
            Environment::Staging => EnvironmentProfile {
                cpu_factor: 0.8,
                storage_factor: 0.7,
                ha_required: true,
            },
            Environment::Qa => EnvironmentProfile {
                cpu_factor: 0.6,
                storage_factor: 0.5,
                ha_required: false,
            },
            Environment::Dev => EnvironmentProfile {
                cpu_factor: 0.4,
                storage_factor: 0.3,
                ha_required: false,
            },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SpecError::UnknownEnvironment(wanted.to_string()))
    }
}

fn default_iops() -> u32 {
    DEFAULT_IOPS
}

fn default_backup_retention_days() -> u32 {
    DEFAULT_BACKUP_RETENTION_DAYS
}

fn default_data_transfer_gb() -> u32 {
    DEFAULT_DATA_TRANSFER_GB
}

/// Observed workload of one database, the input to every sizing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub engine: Engine,
    pub region: Region,
    /// Currently provisioned CPU cores
    pub cores: u32,
    /// Observed peak CPU utilization, 1-100
    pub cpu_util_pct: u32,
    pub ram_gb: u32,
    /// Observed peak RAM utilization, 1-100
    pub ram_util_pct: u32,
    pub storage_gb: u32,
    #[serde(default = "default_iops")]
    pub iops: u32,
    #[serde(default)]
    pub growth_pct_annual: f64,
    #[serde(default = "default_backup_retention_days")]
    pub backup_retention_days: u32,
    #[serde(default = "default_data_transfer_gb")]
    pub data_transfer_gb_month: u32,
}

impl WorkloadSpec {
    pub fn builder() -> WorkloadSpecBuilder {
        WorkloadSpecBuilder::default()
    }
}

/// Builder that rejects incomplete or out-of-range workloads
#[derive(Debug, Clone, Default)]
pub struct WorkloadSpecBuilder {
    engine: Option<Engine>,
    region: Option<Region>,
    cores: Option<u32>,
    cpu_util_pct: Option<u32>,
    ram_gb: Option<u32>,
    ram_util_pct: Option<u32>,
    storage_gb: Option<u32>,
    iops: Option<u32>,
    growth_pct_annual: Option<f64>,
    backup_retention_days: Option<u32>,
    data_transfer_gb_month: Option<u32>,
}

impl WorkloadSpecBuilder {
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn cores(mut self, cores: u32) -> Self {
        self.cores = Some(cores);
        self
    }

    pub fn cpu_util_pct(mut self, pct: u32) -> Self {
        self.cpu_util_pct = Some(pct);
        self
    }

    pub fn ram_gb(mut self, ram_gb: u32) -> Self {
        self.ram_gb = Some(ram_gb);
        self
    }

    pub fn ram_util_pct(mut self, pct: u32) -> Self {
        self.ram_util_pct = Some(pct);
        self
    }

    pub fn storage_gb(mut self, storage_gb: u32) -> Self {
        self.storage_gb = Some(storage_gb);
        self
    }

    pub fn iops(mut self, iops: u32) -> Self {
        self.iops = Some(iops);
        self
    }

    pub fn growth_pct_annual(mut self, growth: f64) -> Self {
        self.growth_pct_annual = Some(growth);
        self
    }

    pub fn backup_retention_days(mut self, days: u32) -> Self {
        self.backup_retention_days = Some(days);
        self
    }

    pub fn data_transfer_gb_month(mut self, gb: u32) -> Self {
        self.data_transfer_gb_month = Some(gb);
        self
    }

    /// Build the workload, failing on the first missing required field and then
    /// on any range violation
    pub fn build(self) -> Result<WorkloadSpec, SpecError> {
        let spec = WorkloadSpec {
            engine: self.engine.ok_or(SpecError::MissingField("engine"))?,
            region: self.region.ok_or(SpecError::MissingField("region"))?,
            cores: self.cores.ok_or(SpecError::MissingField("cores"))?,
            cpu_util_pct: self
                .cpu_util_pct
                .ok_or(SpecError::MissingField("cpu_util_pct"))?,
            ram_gb: self.ram_gb.ok_or(SpecError::MissingField("ram_gb"))?,
            ram_util_pct: self
                .ram_util_pct
                .ok_or(SpecError::MissingField("ram_util_pct"))?,
            storage_gb: self.storage_gb.ok_or(SpecError::MissingField("storage_gb"))?,
            iops: self.iops.unwrap_or(DEFAULT_IOPS),
            growth_pct_annual: self.growth_pct_annual.unwrap_or(0.0),
            backup_retention_days: self
                .backup_retention_days
                .unwrap_or(DEFAULT_BACKUP_RETENTION_DAYS),
            data_transfer_gb_month: self
                .data_transfer_gb_month
                .unwrap_or(DEFAULT_DATA_TRANSFER_GB),
        };

        validation::validate(&spec).map_err(SpecError::Invalid)?;
        Ok(spec)
    }
}

/// A workload tagged with the database name it came from (bulk mode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedWorkload {
    pub name: String,
    #[serde(flatten)]
    pub spec: WorkloadSpec,
    /// Horizon of the cost projection in years
    #[serde(default = "default_projection_years")]
    pub projection_years: u32,
    /// Free-form commentary on the workload, annotated into the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub(crate) fn default_projection_years() -> u32 {
    3
}

/// One selectable database server size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceShape {
    pub type_id: String,
    pub vcpu: u32,
    pub memory_gb: u32,
    pub hourly_price_usd: f64,
}

/// Type id of the capacity-less serverless pseudo-shape
pub const SERVERLESS_TYPE_ID: &str = "db.serverless";

impl InstanceShape {
    pub fn new(type_id: impl Into<String>, vcpu: u32, memory_gb: u32, hourly_price_usd: f64) -> Self {
        Self {
            type_id: type_id.into(),
            vcpu,
            memory_gb,
            hourly_price_usd,
        }
    }

    pub fn is_serverless(&self) -> bool {
        self.type_id == SERVERLESS_TYPE_ID
    }

    /// Family membership is a plain substring match on the type id ("r5", "t3", ...)
    pub fn in_family(&self, family: &str) -> bool {
        self.type_id.contains(family)
    }
}

/// Itemized monthly cost in USD
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub instance: f64,
    pub storage: f64,
    pub iops: f64,
    pub backup: f64,
    pub data_transfer: f64,
    pub monitoring: f64,
    pub total: f64,
}

impl CostBreakdown {
    /// Named components, excluding the total
    pub fn components(&self) -> [(&'static str, f64); 6] {
        [
            ("instance", self.instance),
            ("storage", self.storage),
            ("iops", self.iops),
            ("backup", self.backup),
            ("data_transfer", self.data_transfer),
            ("monitoring", self.monitoring),
        ]
    }
}

/// Sizing recommendation for one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    pub environment: Environment,
    pub instance_type: String,
    pub vcpus: u32,
    pub ram_gb: u32,
    pub storage_gb: u32,
    pub monthly_cost: f64,
    pub annual_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub optimization_score: u8,
    /// The selected shape as priced in the workload's region
    pub instance: InstanceShape,
}

/// Recommendations for a set of environments of one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadAnalysis {
    pub results: Vec<SizingResult>,
    pub total_monthly_cost: f64,
    pub total_annual_cost: f64,
}

impl WorkloadAnalysis {
    pub fn from_results(results: Vec<SizingResult>) -> Self {
        let total_monthly_cost = results.iter().map(|r| r.monthly_cost).sum();
        let total_annual_cost = results.iter().map(|r| r.annual_cost).sum();
        Self {
            results,
            total_monthly_cost,
            total_annual_cost,
        }
    }

    pub fn get(&self, environment: Environment) -> Option<&SizingResult> {
        self.results.iter().find(|r| r.environment == environment)
    }

    pub fn prod(&self) -> Option<&SizingResult> {
        self.get(Environment::Prod)
    }
}
