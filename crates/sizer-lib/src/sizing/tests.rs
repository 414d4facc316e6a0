//! End-to-end sizing properties over the built-in catalog

use super::*;
use crate::catalog::{builtin_multipliers, PricingCatalog};
use crate::models::{Engine, InstanceShape, Region};
use std::collections::BTreeMap;

fn reference_spec() -> WorkloadSpec {
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

/// A spread of workloads from tiny to large across every engine and region
fn workload_grid() -> Vec<WorkloadSpec> {
    let mut specs = Vec::new();
    for engine in Engine::ALL {
        for region in Region::ALL {
            for (cores, cpu, ram, ram_util, storage, growth) in [
                (1, 1, 1, 1, 1, 0.0),
                (2, 30, 4, 50, 20, 5.0),
                (4, 50, 16, 50, 200, 10.0),
                (16, 65, 64, 75, 1000, 15.0),
                (64, 90, 512, 95, 20000, 40.0),
                (1000, 100, 10000, 100, 1_000_000, 1000.0),
            ] {
                specs.push(WorkloadSpec {
                    engine,
                    region,
                    cores,
                    cpu_util_pct: cpu,
                    ram_gb: ram,
                    ram_util_pct: ram_util,
                    storage_gb: storage,
                    iops: 3000 + cores * 100,
                    growth_pct_annual: growth,
                    backup_retention_days: 14,
                    data_transfer_gb_month: 250,
                });
            }
        }
    }
    specs
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_reference_prod_scenario() {
    let engine = SizingEngine::default();
    let result = engine.compute_requirements(&reference_spec(), Environment::Prod);

    assert_eq!(result.vcpus, 12);
    assert_eq!(result.ram_gb, 57);
    assert_eq!(result.storage_gb, 1719);
    // every postgres m5 shape is undersized with the same price per vCPU,
    // so the first one in catalog order wins
    assert_eq!(result.instance_type, "db.m5.large");

    let costs = result.cost_breakdown;
    assert!(close(costs.instance, 276.48));
    assert!(close(costs.storage, 197.685));
    assert!(close(costs.iops, 25.0));
    assert!(close(costs.backup, 38.1045));
    assert!(close(costs.data_transfer, 9.0));
    assert!(close(costs.monitoring, 27.648));
    assert!(close(result.monthly_cost, 573.9175));
    assert!(close(result.annual_cost, 573.9175 * 12.0));
    assert_eq!(result.optimization_score, 100);
}

#[test]
fn test_reference_dev_scenario() {
    let engine = SizingEngine::default();
    let result = engine.compute_requirements(&reference_spec(), Environment::Dev);

    assert_eq!(result.vcpus, 4);
    assert_eq!(result.ram_gb, 19);
    assert_eq!(result.storage_gb, 300);
    assert!(result.instance_type.contains("t3"));
    assert_eq!(result.instance_type, "db.t3.micro");
    assert_eq!(result.cost_breakdown.monitoring, 0.0);
    assert!(close(result.cost_breakdown.instance, 0.0255 * 24.0 * 30.0));
    assert!(close(result.monthly_cost, 93.51));
}

#[test]
fn test_reference_staging_and_qa() {
    let engine = SizingEngine::default();
    let analysis = engine.analyze(&reference_spec());

    let staging = analysis.get(Environment::Staging).unwrap();
    assert_eq!(staging.instance_type, "db.m5.2xlarge");
    assert_eq!(staging.storage_gb, 925);
    assert!(close(staging.monthly_cost, 713.8391666666668));

    let qa = analysis.get(Environment::Qa).unwrap();
    assert_eq!(qa.instance_type, "db.m5.2xlarge");
    assert_eq!(qa.optimization_score, 81);
    assert!(close(qa.monthly_cost, 655.5433333333334));
}

#[test]
fn test_engine_specific_selections() {
    let engine = SizingEngine::default();
    let expected = [
        (Engine::OracleEe, ["db.r5.2xlarge", "db.m5.2xlarge", "db.m5.2xlarge", "db.t3.medium"]),
        (Engine::AuroraPostgresql, ["db.r5.2xlarge", "db.t3.medium", "db.t3.medium", "db.t3.medium"]),
        (Engine::AuroraMysql, ["db.r5.large", "db.t3.medium", "db.t3.medium", "db.t3.medium"]),
        (Engine::Sqlserver, ["db.m5.large", "db.m5.2xlarge", "db.m5.2xlarge", "db.t3.small"]),
        (Engine::OracleSe, ["db.r5.large", "db.t3.medium", "db.t3.medium", "db.t3.medium"]),
    ];

    for (db_engine, types) in expected {
        let spec = WorkloadSpec {
            engine: db_engine,
            region: Region::EuWest1,
            ..reference_spec()
        };
        let analysis = engine.analyze(&spec);
        let selected: Vec<_> = analysis
            .results
            .iter()
            .map(|r| r.instance_type.as_str())
            .collect();
        assert_eq!(selected, types, "{db_engine}");
    }
}

#[test]
fn test_regional_price_flows_into_cost() {
    let engine = SizingEngine::default();
    let spec = WorkloadSpec {
        region: Region::ApSoutheast1,
        ..reference_spec()
    };
    let result = engine.compute_requirements(&spec, Environment::Prod);
    assert!(close(result.instance.hourly_price_usd, 0.192 * 1.15));
    assert!(close(result.cost_breakdown.instance, 0.192 * 1.15 * 24.0 * 30.0 * 2.0));
}

#[test]
fn test_determinism() {
    let engine = SizingEngine::default();
    for spec in workload_grid() {
        for env in Environment::ALL {
            let first = engine.compute_requirements(&spec, env);
            let second = engine.compute_requirements(&spec, env);
            assert_eq!(first, second);
            assert_eq!(first.monthly_cost.to_bits(), second.monthly_cost.to_bits());
        }
    }
}

#[test]
fn test_independent_catalogs_agree() {
    let a = SizingEngine::new(Arc::new(PricingCatalog::builtin()));
    let b = SizingEngine::new(Arc::new(PricingCatalog::builtin()));
    let spec = reference_spec();
    assert_eq!(a.analyze(&spec), b.analyze(&spec));
}

#[test]
fn test_floors_hold_everywhere() {
    let engine = SizingEngine::default();
    for spec in workload_grid() {
        for env in Environment::ALL {
            let (vcpu_floor, ram_floor, _) = floors(env);
            let result = engine.compute_requirements(&spec, env);
            assert!(result.vcpus >= vcpu_floor);
            assert!(result.ram_gb >= ram_floor);
        }
    }
}

#[test]
fn test_prod_at_least_dev() {
    let engine = SizingEngine::default();
    for spec in workload_grid() {
        let prod = engine.compute_requirements(&spec, Environment::Prod);
        let dev = engine.compute_requirements(&spec, Environment::Dev);
        assert!(prod.vcpus >= dev.vcpus);
        assert!(prod.ram_gb >= dev.ram_gb);
        assert!(prod.storage_gb >= dev.storage_gb);
    }
}

#[test]
fn test_cost_additivity() {
    let engine = SizingEngine::default();
    for spec in workload_grid() {
        for env in Environment::ALL {
            let result = engine.compute_requirements(&spec, env);
            let breakdown = result.cost_breakdown;
            let sum: f64 = breakdown.components().iter().map(|(_, v)| v).sum();
            assert!(close(breakdown.total, sum));
            assert_eq!(result.monthly_cost, breakdown.total);
        }
    }
}

#[test]
fn test_only_prod_pays_ha_surcharge() {
    let engine = SizingEngine::default();
    for spec in workload_grid() {
        for env in Environment::ALL {
            let result = engine.compute_requirements(&spec, env);
            let raw = result.instance.hourly_price_usd * 24.0 * 30.0;
            let expected = if env == Environment::Prod { raw * 2.0 } else { raw };
            assert_eq!(result.cost_breakdown.instance, expected, "{env}");
        }
    }
}

#[test]
fn test_optimization_score_bounded() {
    let engine = SizingEngine::default();
    for spec in workload_grid() {
        for env in Environment::ALL {
            let result = engine.compute_requirements(&spec, env);
            assert!(result.optimization_score <= 100);
        }
    }
}

#[test]
fn test_serverless_only_catalog() {
    let mut base = BTreeMap::new();
    base.insert(
        Engine::AuroraMysql,
        vec![InstanceShape::new("db.serverless", 0, 0, 0.12)],
    );
    let catalog = PricingCatalog::from_base_table("us-east-1", base, builtin_multipliers());
    let engine = SizingEngine::new(Arc::new(catalog));

    let spec = WorkloadSpec {
        engine: Engine::AuroraMysql,
        ..reference_spec()
    };
    for env in Environment::ALL {
        let result = engine.compute_requirements(&spec, env);
        assert_eq!(result.instance_type, "db.serverless");
        assert_eq!(result.optimization_score, 95);
    }
}

#[test]
fn test_empty_catalog_still_sizes() {
    let catalog = PricingCatalog::from_base_table("us-east-1", BTreeMap::new(), BTreeMap::new());
    let engine = SizingEngine::new(Arc::new(catalog));
    let analysis = engine.analyze(&reference_spec());

    assert_eq!(analysis.results.len(), 4);
    for result in &analysis.results {
        assert_eq!(result.instance_type, "db.m5.large");
        assert!(result.monthly_cost > 0.0);
    }
}

#[test]
fn test_analysis_totals_and_order() {
    let engine = SizingEngine::default();
    let analysis = engine.analyze(&reference_spec());

    let envs: Vec<_> = analysis.results.iter().map(|r| r.environment).collect();
    assert_eq!(envs, Environment::ALL.to_vec());

    let monthly: f64 = analysis.results.iter().map(|r| r.monthly_cost).sum();
    assert!(close(analysis.total_monthly_cost, monthly));
    assert!(close(analysis.total_annual_cost, monthly * 12.0));
}

#[test]
fn test_subset_of_environments() {
    let engine = SizingEngine::default();
    let analysis =
        engine.analyze_environments(&reference_spec(), &[Environment::Dev, Environment::Prod]);
    assert_eq!(analysis.results.len(), 2);
    assert_eq!(analysis.results[0].environment, Environment::Dev);
    assert!(analysis.get(Environment::Qa).is_none());
}

#[test]
fn test_repeated_environments_sized_once() {
    let engine = SizingEngine::default();
    let spec = reference_spec();
    let repeated = engine.analyze_environments(
        &spec,
        &[Environment::Prod, Environment::Dev, Environment::Prod],
    );
    let once = engine.analyze_environments(&spec, &[Environment::Prod, Environment::Dev]);

    assert_eq!(repeated, once);
    assert_eq!(repeated.results.len(), 2);
    assert_eq!(repeated.total_monthly_cost, once.total_monthly_cost);
}

#[test]
fn test_batch_preserves_input_order() {
    let engine = SizingEngine::default();
    let workloads: Vec<NamedWorkload> = workload_grid()
        .into_iter()
        .take(25)
        .enumerate()
        .map(|(i, spec)| NamedWorkload {
            name: format!("db-{i:02}"),
            spec,
            projection_years: 3,
            notes: None,
        })
        .collect();

    let reports = engine.analyze_batch(&workloads);
    assert_eq!(reports.len(), workloads.len());
    for (report, workload) in reports.iter().zip(&workloads) {
        assert_eq!(report.name, workload.name);
        assert_eq!(report.analysis, engine.analyze(&workload.spec));
    }
}

#[test]
fn test_engine_is_shareable_across_threads() {
    let engine = SizingEngine::default();
    let spec = reference_spec();
    let expected = engine.analyze(&spec);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let spec = spec.clone();
            std::thread::spawn(move || engine.analyze(&spec))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
