//! Range checks run by callers before a workload reaches the sizing engine
//!
//! The engine itself never rejects input; it trusts that this step has run.
//! Every violation is collected so a form or bulk row can report all of them
//! at once.

use crate::error::ValidationError;
use crate::models::{NamedWorkload, WorkloadSpec};

/// Core counts above this are treated as a data entry mistake
pub const MAX_CORES: u32 = 1_000;

/// RAM above 10 TB is treated as a data entry mistake
pub const MAX_RAM_GB: u32 = 10_000;

/// Storage above 1 PB is treated as a data entry mistake
pub const MAX_STORAGE_GB: u32 = 1_000_000;

/// Annual growth above 1000% is treated as a data entry mistake
pub const MAX_GROWTH_PCT: f64 = 1_000.0;

/// Backup retention window accepted by the managed service
pub const BACKUP_RETENTION_RANGE: std::ops::RangeInclusive<u32> = 1..=35;

/// Accepted cost projection horizon in years
pub const PROJECTION_YEARS_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

/// Validate a workload, returning every violation found
pub fn validate(spec: &WorkloadSpec) -> Result<(), Vec<ValidationError>> {
    let mut issues = Vec::new();

    let required = [
        ("cores", spec.cores),
        ("ram_gb", spec.ram_gb),
        ("storage_gb", spec.storage_gb),
        ("cpu_util_pct", spec.cpu_util_pct),
        ("ram_util_pct", spec.ram_util_pct),
    ];
    for (field, value) in required {
        if value == 0 {
            issues.push(ValidationError::NotPositive { field });
        }
    }

    for (field, value) in [
        ("cpu_util_pct", spec.cpu_util_pct),
        ("ram_util_pct", spec.ram_util_pct),
    ] {
        if value > 100 {
            issues.push(ValidationError::UtilizationAbove100 { field, value });
        }
    }

    let growth = spec.growth_pct_annual;
    if !growth.is_finite() {
        issues.push(ValidationError::NonFiniteGrowth);
    } else if growth < 0.0 {
        issues.push(ValidationError::NegativeGrowth { value: growth });
    } else if growth > MAX_GROWTH_PCT {
        issues.push(ValidationError::Unrealistic {
            field: "growth_pct_annual",
            value: growth,
            limit: MAX_GROWTH_PCT,
        });
    }

    if !BACKUP_RETENTION_RANGE.contains(&spec.backup_retention_days) {
        issues.push(ValidationError::BackupRetention {
            value: spec.backup_retention_days,
        });
    }

    for (field, value, limit) in [
        ("cores", spec.cores, MAX_CORES),
        ("ram_gb", spec.ram_gb, MAX_RAM_GB),
        ("storage_gb", spec.storage_gb, MAX_STORAGE_GB),
    ] {
        if value > limit {
            issues.push(ValidationError::Unrealistic {
                field,
                value: f64::from(value),
                limit: f64::from(limit),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Validate a named workload: its spec plus the projection horizon
pub fn validate_named(workload: &NamedWorkload) -> Result<(), Vec<ValidationError>> {
    let mut issues = validate(&workload.spec).err().unwrap_or_default();
    if let Err(issue) = check_projection_years(workload.projection_years) {
        issues.push(issue);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

pub fn check_projection_years(years: u32) -> Result<(), ValidationError> {
    if PROJECTION_YEARS_RANGE.contains(&years) {
        Ok(())
    } else {
        Err(ValidationError::ProjectionYears { value: years })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Engine, Region};

    fn spec() -> WorkloadSpec {
        WorkloadSpec {
            engine: Engine::Postgres,
            region: Region::UsEast1,
            cores: 16,
            cpu_util_pct: 65,
            ram_gb: 64,
            ram_util_pct: 75,
            storage_gb: 1000,
            iops: 8000,
            growth_pct_annual: 15.0,
            backup_retention_days: 7,
            data_transfer_gb_month: 100,
        }
    }

    #[test]
    fn test_valid_spec_passes() {
        assert!(validate(&spec()).is_ok());
    }

    #[test]
    fn test_collects_every_issue() {
        let mut bad = spec();
        bad.cores = 0;
        bad.cpu_util_pct = 120;
        bad.growth_pct_annual = -5.0;
        bad.backup_retention_days = 40;

        let issues = validate(&bad).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ValidationError::NotPositive { field: "cores" }));
        assert!(issues.contains(&ValidationError::BackupRetention { value: 40 }));
    }

    #[test]
    fn test_unrealistic_values() {
        let mut bad = spec();
        bad.storage_gb = 2_000_000;
        bad.growth_pct_annual = 5_000.0;

        let issues = validate(&bad).unwrap_err();
        let fields: Vec<_> = issues.iter().map(|i| i.field()).collect();
        assert_eq!(fields, vec!["growth_pct_annual", "storage_gb"]);
    }

    #[test]
    fn test_nan_growth_rejected() {
        let mut bad = spec();
        bad.growth_pct_annual = f64::NAN;
        assert_eq!(
            validate(&bad).unwrap_err(),
            vec![ValidationError::NonFiniteGrowth]
        );
    }

    #[test]
    fn test_utilization_boundaries() {
        let mut edge = spec();
        edge.cpu_util_pct = 100;
        edge.ram_util_pct = 1;
        assert!(validate(&edge).is_ok());
    }

    #[test]
    fn test_projection_years_bounds() {
        let mut named = NamedWorkload {
            name: "orders".to_string(),
            spec: spec(),
            projection_years: 30,
            notes: None,
        };
        assert!(validate_named(&named).is_ok());

        named.projection_years = 0;
        assert_eq!(
            validate_named(&named).unwrap_err(),
            vec![ValidationError::ProjectionYears { value: 0 }]
        );

        named.projection_years = 4_000_000_000;
        named.spec.cores = 0;
        let fields: Vec<_> = validate_named(&named)
            .unwrap_err()
            .iter()
            .map(|i| i.field())
            .collect();
        assert_eq!(fields, vec!["cores", "projection_years"]);
    }
}
