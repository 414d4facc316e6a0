//! Sizing engine
//!
//! Turns a [`WorkloadSpec`] into one [`SizingResult`] per environment:
//! derive resource targets, pick the best-fit shape from the pricing catalog,
//! then price it. Every function here is pure; the only shared state is the
//! read-only catalog, so one engine can serve any number of threads.

mod cost;
mod requirements;
mod selection;

#[cfg(test)]
mod tests;

pub use cost::{monthly_costs, DAYS_PER_MONTH, HOURS_PER_DAY, INCLUDED_IOPS, PROD_HA_NODES};
pub use requirements::{derive as derive_requirements, floors, Requirements};
pub use selection::{
    fallback_shape, optimization_score, preferred_families, score_shape, select_instance,
    Selection,
};

use crate::catalog::PricingCatalog;
use crate::models::{Environment, NamedWorkload, SizingResult, WorkloadAnalysis, WorkloadSpec};
use crate::report::WorkloadReport;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Months in a billing year
const MONTHS_PER_YEAR: f64 = 12.0;

/// Sizing engine bound to one pricing catalog
#[derive(Debug, Clone)]
pub struct SizingEngine {
    catalog: Arc<PricingCatalog>,
}

impl SizingEngine {
    pub fn new(catalog: Arc<PricingCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    /// Produce the recommendation for a single environment
    pub fn compute_requirements(&self, spec: &WorkloadSpec, environment: Environment) -> SizingResult {
        let req = requirements::derive(spec, environment);
        let candidates = self.catalog.shapes_for(spec.region.as_str(), spec.engine);
        let selection = selection::select_instance(candidates, &req, environment);
        let costs = cost::monthly_costs(&selection.shape, req.storage_gb, spec, environment);

        debug!(
            environment = %environment,
            engine = %spec.engine,
            region = %spec.region,
            instance_type = %selection.shape.type_id,
            score = ?selection.score,
            candidates = candidates.len(),
            "Instance selected"
        );

        SizingResult {
            environment,
            instance_type: selection.shape.type_id.clone(),
            vcpus: req.vcpus,
            ram_gb: req.ram_gb,
            storage_gb: req.storage_gb,
            monthly_cost: costs.total,
            annual_cost: costs.total * MONTHS_PER_YEAR,
            cost_breakdown: costs,
            optimization_score: selection::optimization_score(&selection.shape, &req),
            instance: selection.shape,
        }
    }

    /// Size every environment, in PROD, STAGING, QA, DEV order
    pub fn analyze(&self, spec: &WorkloadSpec) -> WorkloadAnalysis {
        self.analyze_environments(spec, &Environment::ALL)
    }

    /// Size the given environments, in the order given
    ///
    /// Repeated environments are sized once, at their first position.
    pub fn analyze_environments(
        &self,
        spec: &WorkloadSpec,
        environments: &[Environment],
    ) -> WorkloadAnalysis {
        let mut unique: Vec<Environment> = Vec::with_capacity(environments.len());
        for env in environments {
            if !unique.contains(env) {
                unique.push(*env);
            }
        }

        let results = unique
            .into_iter()
            .map(|env| self.compute_requirements(spec, env))
            .collect();
        WorkloadAnalysis::from_results(results)
    }

    /// Size a batch of named workloads in parallel, preserving input order
    pub fn analyze_batch(&self, workloads: &[NamedWorkload]) -> Vec<WorkloadReport> {
        workloads
            .par_iter()
            .map(|workload| WorkloadReport::new(workload.clone(), self.analyze(&workload.spec)))
            .collect()
    }
}

impl Default for SizingEngine {
    fn default() -> Self {
        Self::new(Arc::new(PricingCatalog::builtin()))
    }
}
