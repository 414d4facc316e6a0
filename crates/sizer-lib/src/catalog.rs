//! Static instance pricing catalog
//!
//! The catalog is seeded with a hand-curated table for the base region. Every
//! other region gets a copy of that table with each hourly price scaled by the
//! region's multiplier. After construction the catalog is never mutated, so a
//! single instance can be shared behind an `Arc` by every request.

use crate::models::{Engine, InstanceShape, Region};
use std::collections::BTreeMap;
use tracing::debug;

/// Region whose prices are authoritative
pub const BASE_REGION: Region = Region::UsEast1;

/// Engine whose shapes are served when a requested engine has no entry
pub const DEFAULT_ENGINE: Engine = Engine::Postgres;

/// Shape served when the catalog has nothing at all for a lookup
pub fn generic_shape() -> InstanceShape {
    InstanceShape::new("db.m5.large", 2, 8, 0.40)
}

/// Per-region on-demand price multipliers relative to the base region
pub fn builtin_multipliers() -> BTreeMap<String, f64> {
    [
        (Region::UsEast1, 1.0),
        (Region::UsWest1, 1.08),
        (Region::UsWest2, 1.05),
        (Region::EuWest1, 1.12),
        (Region::ApSoutheast1, 1.15),
    ]
    .into_iter()
    .map(|(region, multiplier)| (region.as_str().to_string(), multiplier))
    .collect()
}

/// Hand-curated shapes for the base region
pub fn builtin_base_table() -> BTreeMap<Engine, Vec<InstanceShape>> {
    let shape = |type_id: &str, vcpu, memory_gb, price| {
        InstanceShape::new(type_id, vcpu, memory_gb, price)
    };
    let mut table = BTreeMap::new();

    table.insert(
        Engine::OracleEe,
        vec![
            shape("db.t3.medium", 2, 4, 0.136),
            shape("db.m5.large", 2, 8, 0.475),
            shape("db.m5.xlarge", 4, 16, 0.95),
            shape("db.m5.2xlarge", 8, 32, 1.90),
            shape("db.r5.large", 2, 16, 0.60),
            shape("db.r5.xlarge", 4, 32, 1.20),
            shape("db.r5.2xlarge", 8, 64, 1.92),
        ],
    );
    table.insert(
        Engine::AuroraPostgresql,
        vec![
            shape("db.t3.medium", 2, 4, 0.082),
            shape("db.r5.large", 2, 16, 0.285),
            shape("db.r5.xlarge", 4, 32, 0.57),
            shape("db.r5.2xlarge", 8, 64, 1.14),
            shape("db.serverless", 0, 0, 0.12),
        ],
    );
    table.insert(
        Engine::Postgres,
        vec![
            shape("db.t3.micro", 2, 1, 0.0255),
            shape("db.t3.small", 2, 2, 0.051),
            shape("db.t3.medium", 2, 4, 0.102),
            shape("db.m5.large", 2, 8, 0.192),
            shape("db.m5.xlarge", 4, 16, 0.384),
            shape("db.m5.2xlarge", 8, 32, 0.768),
        ],
    );
    table.insert(
        Engine::Sqlserver,
        vec![
            shape("db.t3.small", 2, 2, 0.231),
            shape("db.m5.large", 2, 8, 0.693),
            shape("db.m5.xlarge", 4, 16, 1.386),
            shape("db.m5.2xlarge", 8, 32, 2.772),
        ],
    );
    table.insert(
        Engine::AuroraMysql,
        vec![
            shape("db.t3.medium", 2, 4, 0.082),
            shape("db.r5.large", 2, 16, 0.285),
            shape("db.r5.xlarge", 4, 32, 0.57),
            shape("db.serverless", 0, 0, 0.12),
        ],
    );
    table.insert(
        Engine::OracleSe,
        vec![
            shape("db.t3.medium", 2, 4, 0.105),
            shape("db.m5.large", 2, 8, 0.365),
            shape("db.m5.xlarge", 4, 16, 0.730),
            shape("db.r5.large", 2, 16, 0.462),
        ],
    );

    table
}

/// Region- and engine-indexed table of candidate instance shapes
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    regions: BTreeMap<String, BTreeMap<Engine, Vec<InstanceShape>>>,
    multipliers: BTreeMap<String, f64>,
    base_region: String,
    generic: Vec<InstanceShape>,
}

impl PricingCatalog {
    /// Catalog with the built-in base table and regional multipliers
    pub fn builtin() -> Self {
        Self::from_base_table(BASE_REGION.as_str(), builtin_base_table(), builtin_multipliers())
    }

    /// Build a catalog from a base region table, deriving every other region
    /// listed in `multipliers` by scaling the base prices
    pub fn from_base_table(
        base_region: &str,
        base: BTreeMap<Engine, Vec<InstanceShape>>,
        multipliers: BTreeMap<String, f64>,
    ) -> Self {
        let mut regions = BTreeMap::new();

        for (region, multiplier) in &multipliers {
            if region == base_region {
                continue;
            }
            let derived = base
                .iter()
                .map(|(engine, shapes)| {
                    let scaled = shapes
                        .iter()
                        .map(|s| InstanceShape {
                            hourly_price_usd: s.hourly_price_usd * multiplier,
                            ..s.clone()
                        })
                        .collect();
                    (*engine, scaled)
                })
                .collect();
            regions.insert(region.clone(), derived);
        }
        regions.insert(base_region.to_string(), base);

        debug!(
            regions = regions.len(),
            base_region = %base_region,
            "Pricing catalog constructed"
        );

        Self {
            regions,
            multipliers,
            base_region: base_region.to_string(),
            generic: vec![generic_shape()],
        }
    }

    /// Candidate shapes for a region and engine, in catalog order
    ///
    /// Unknown regions resolve to the base region, engines without an entry
    /// resolve to the default engine of that region, and if nothing is left
    /// a single generic shape is returned. The result is never empty.
    pub fn shapes_for(&self, region: &str, engine: Engine) -> &[InstanceShape] {
        let region_table = match self.regions.get(region) {
            Some(table) => table,
            None => {
                debug!(region = %region, fallback = %self.base_region, "Region not in catalog");
                match self.regions.get(&self.base_region) {
                    Some(table) => table,
                    None => return &self.generic,
                }
            }
        };

        let shapes = region_table
            .get(&engine)
            .or_else(|| {
                debug!(engine = %engine, fallback = %DEFAULT_ENGINE, "Engine not in catalog");
                region_table.get(&DEFAULT_ENGINE)
            })
            .map(Vec::as_slice)
            .unwrap_or_default();

        if shapes.is_empty() {
            &self.generic
        } else {
            shapes
        }
    }

    /// True when `shapes_for` would answer from the requested region and
    /// engine without any fallback
    pub fn has_exact(&self, region: &str, engine: Engine) -> bool {
        self.regions
            .get(region)
            .and_then(|table| table.get(&engine))
            .is_some_and(|shapes| !shapes.is_empty())
    }

    /// Flat price multiplier for a region; 1.0 when the region is unknown
    pub fn regional_multiplier(&self, region: &str) -> f64 {
        self.multipliers.get(region).copied().unwrap_or(1.0)
    }

    /// Regions with their multipliers, sorted by region code
    pub fn regions(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.regions
            .keys()
            .map(move |region| (region.as_str(), self.regional_multiplier(region)))
    }

    pub fn base_region(&self) -> &str {
        &self.base_region
    }
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
