//! Greedy best-fit instance selection
//!
//! Every candidate is scored once and the strictly highest score wins, so the
//! first shape in catalog order is kept on ties. There is no search beyond a
//! single linear pass.

use super::requirements::Requirements;
use crate::models::{Environment, InstanceShape};
use serde::Serialize;

/// Fit scores for the three headroom bands of one environment
struct FitBands {
    /// Inclusive range of capacity/requirement ratios considered ideal
    ideal: (f64, f64),
    ideal_score: f64,
    /// Score for a shape that meets the requirement outside the ideal band
    sufficient_score: f64,
    /// Score for an undersized shape
    undersized_score: f64,
}

fn fit_bands(environment: Environment) -> FitBands {
    match environment {
        Environment::Prod => FitBands {
            ideal: (1.2, 1.8),
            ideal_score: 1.2,
            sufficient_score: 1.0,
            undersized_score: 0.3,
        },
        Environment::Staging | Environment::Qa => FitBands {
            ideal: (1.1, 1.5),
            ideal_score: 1.0,
            sufficient_score: 0.8,
            undersized_score: 0.4,
        },
        Environment::Dev => FitBands {
            ideal: (1.0, 1.3),
            ideal_score: 1.0,
            sufficient_score: 0.7,
            undersized_score: 0.2,
        },
    }
}

fn fit(ratio: f64, bands: &FitBands) -> f64 {
    let (low, high) = bands.ideal;
    if (low..=high).contains(&ratio) {
        bands.ideal_score
    } else if ratio >= 1.0 {
        bands.sufficient_score
    } else {
        bands.undersized_score
    }
}

/// Weight of price efficiency in the score; cost matters most for DEV
fn cost_weight(environment: Environment) -> f64 {
    match environment {
        Environment::Prod => 0.3,
        Environment::Staging | Environment::Qa => 0.5,
        Environment::Dev => 0.7,
    }
}

/// Instance families preferred before scoring
pub fn preferred_families(environment: Environment) -> &'static [&'static str] {
    match environment {
        Environment::Prod => &["r5", "m5"],
        Environment::Staging | Environment::Qa => &["t3", "m5"],
        Environment::Dev => &["t3"],
    }
}

fn family_bonus(shape: &InstanceShape, environment: Environment) -> f64 {
    match environment {
        Environment::Prod if shape.in_family("r5") => 0.3,
        Environment::Prod if shape.in_family("m5") => 0.2,
        Environment::Dev if shape.in_family("t3") => 0.3,
        _ => 0.0,
    }
}

fn serverless_score(environment: Environment) -> f64 {
    match environment {
        Environment::Dev => 120.0,
        Environment::Staging | Environment::Qa => 100.0,
        Environment::Prod => 60.0,
    }
}

/// Score one candidate against the requirements of an environment
pub fn score_shape(shape: &InstanceShape, req: &Requirements, environment: Environment) -> f64 {
    if shape.is_serverless() {
        return serverless_score(environment);
    }

    let bands = fit_bands(environment);
    let cpu_ratio = f64::from(shape.vcpu) / f64::from(req.vcpus.max(1));
    let ram_ratio = f64::from(shape.memory_gb) / f64::from(req.ram_gb.max(1));

    let cost_per_vcpu = shape.hourly_price_usd / f64::from(shape.vcpu.max(1));
    let cost_efficiency = (1.0 / (cost_per_vcpu + 1.0)) * cost_weight(environment);

    (fit(cpu_ratio, &bands) + fit(ram_ratio, &bands) + cost_efficiency
        + family_bonus(shape, environment))
        * 100.0
}

/// Shape used when there are no candidates at all, keyed by tier only
pub fn fallback_shape(environment: Environment) -> InstanceShape {
    match environment {
        Environment::Dev => InstanceShape::new("db.t3.micro", 2, 1, 0.017),
        Environment::Staging | Environment::Qa => {
            InstanceShape::new("db.t3.medium", 2, 4, 0.068)
        }
        Environment::Prod => InstanceShape::new("db.m5.large", 2, 8, 0.4),
    }
}

/// Outcome of instance selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub shape: InstanceShape,
    /// None when the tier fallback was used
    pub score: Option<f64>,
}

/// Pick the best-scoring candidate for the environment
pub fn select_instance(
    candidates: &[InstanceShape],
    req: &Requirements,
    environment: Environment,
) -> Selection {
    let families = preferred_families(environment);
    let preferred: Vec<&InstanceShape> = candidates
        .iter()
        .filter(|shape| families.iter().any(|family| shape.in_family(family)))
        .collect();
    let pool: Vec<&InstanceShape> = if preferred.is_empty() {
        candidates.iter().collect()
    } else {
        preferred
    };

    let mut best: Option<(&InstanceShape, f64)> = None;
    for shape in pool {
        let score = score_shape(shape, req, environment);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((shape, score)),
        }
    }

    match best {
        Some((shape, score)) => Selection {
            shape: shape.clone(),
            score: Some(score),
        },
        // no candidates at all
        None => Selection {
            shape: fallback_shape(environment),
            score: None,
        },
    }
}

/// How tightly the chosen shape's capacity is used, 0-100
pub fn optimization_score(shape: &InstanceShape, req: &Requirements) -> u8 {
    if shape.is_serverless() {
        return 95;
    }

    let efficiency = |required: u32, capacity: u32| {
        if capacity == 0 {
            1.0
        } else {
            (f64::from(required) / f64::from(capacity)).min(1.0)
        }
    };
    let avg =
        (efficiency(req.vcpus, shape.vcpu) + efficiency(req.ram_gb, shape.memory_gb)) / 2.0;

    (avg * 100.0) as u8
}
