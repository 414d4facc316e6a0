//! Derivation of per-environment resource targets from an observed workload

use crate::models::{Environment, WorkloadSpec};
use serde::Serialize;

/// Extra headroom applied to PROD compute and storage
const PROD_HEADROOM: f64 = 1.2;
const PROD_STORAGE_HEADROOM: f64 = 1.3;

/// Years of storage growth provisioned for long-lived environments
const GROWTH_YEARS: i32 = 2;

/// Resource targets for one environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Requirements {
    pub vcpus: u32,
    pub ram_gb: u32,
    pub storage_gb: u32,
}

/// Hard minimums (vcpus, ram_gb, storage_gb) per environment
pub fn floors(environment: Environment) -> (u32, u32, u32) {
    match environment {
        Environment::Prod => (4, 8, 100),
        Environment::Staging => (2, 4, 50),
        Environment::Qa => (2, 4, 20),
        Environment::Dev => (1, 2, 20),
    }
}

/// Truncate toward zero; negative and NaN values become 0
fn truncate(value: f64) -> u32 {
    value as u32
}

/// Compute the vCPU, RAM and storage an environment should be provisioned with
pub fn derive(spec: &WorkloadSpec, environment: Environment) -> Requirements {
    let profile = environment.profile();
    let (vcpu_floor, ram_floor, storage_floor) = floors(environment);

    let base_vcpus = f64::from(spec.cores) * (f64::from(spec.cpu_util_pct) / 100.0);
    let base_ram = f64::from(spec.ram_gb) * (f64::from(spec.ram_util_pct) / 100.0);
    let storage = f64::from(spec.storage_gb);

    let (vcpus, ram_gb, storage_gb) = match environment {
        Environment::Prod => (
            base_vcpus * profile.cpu_factor * PROD_HEADROOM,
            base_ram * profile.cpu_factor * PROD_HEADROOM,
            storage * profile.storage_factor * PROD_STORAGE_HEADROOM,
        ),
        Environment::Staging | Environment::Qa | Environment::Dev => (
            base_vcpus * profile.cpu_factor,
            base_ram * profile.cpu_factor,
            storage * profile.storage_factor,
        ),
    };

    let vcpus = vcpu_floor.max(truncate(vcpus));
    let ram_gb = ram_floor.max(truncate(ram_gb));
    let mut storage_gb = storage_floor.max(truncate(storage_gb));

    // QA and DEV are short-lived and are not provisioned for growth.
    if matches!(environment, Environment::Prod | Environment::Staging) {
        let growth = (1.0 + spec.growth_pct_annual / 100.0).powi(GROWTH_YEARS);
        storage_gb = truncate(f64::from(storage_gb) * growth);
    }

    Requirements {
        vcpus,
        ram_gb,
        storage_gb,
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
    fn test_prod_requirements() {
        let req = derive(&spec(), Environment::Prod);
        assert_eq!(
            req,
            Requirements {
                vcpus: 12,
                ram_gb: 57,
                storage_gb: 1719
            }
        );
    }

    #[test]
    fn test_staging_requirements_grow_storage() {
        // 1000 * 0.7 = 700, grown by 1.15^2
        let req = derive(&spec(), Environment::Staging);
        assert_eq!(req.vcpus, 8);
        assert_eq!(req.ram_gb, 38);
        assert_eq!(req.storage_gb, 925);
    }

    #[test]
    fn test_qa_and_dev_ignore_growth() {
        let qa = derive(&spec(), Environment::Qa);
        assert_eq!(qa.storage_gb, 500);

        let dev = derive(&spec(), Environment::Dev);
        assert_eq!(
            dev,
            Requirements {
                vcpus: 4,
                ram_gb: 19,
                storage_gb: 300
            }
        );
    }

    #[test]
    fn test_floors_apply_to_tiny_workloads() {
        let mut tiny = spec();
        tiny.cores = 1;
        tiny.cpu_util_pct = 1;
        tiny.ram_gb = 1;
        tiny.ram_util_pct = 1;
        tiny.storage_gb = 1;
        tiny.growth_pct_annual = 0.0;

        for env in Environment::ALL {
            let (vcpu, ram, storage) = floors(env);
            let req = derive(&tiny, env);
            assert_eq!(req.vcpus, vcpu, "{env}");
            assert_eq!(req.ram_gb, ram, "{env}");
            assert_eq!(req.storage_gb, storage, "{env}");
        }
    }

    #[test]
    fn test_floor_applied_before_growth() {
        let mut small = spec();
        small.storage_gb = 10;
        small.growth_pct_annual = 100.0;

        // floor 100, then x4 for two years of doubling
        assert_eq!(derive(&small, Environment::Prod).storage_gb, 400);
        // DEV keeps its floor untouched
        assert_eq!(derive(&small, Environment::Dev).storage_gb, 20);
    }
}
