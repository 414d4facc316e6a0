//! Pricing catalog commands

use anyhow::{Context, Result};
use serde::Serialize;
use sizer_lib::{
    sizing::{DAYS_PER_MONTH, HOURS_PER_DAY},
    Engine, InstanceShape, PricingCatalog,
};
use tabled::Tabled;

use crate::client::{ApiClient, CatalogRegions, CatalogShapes, RegionEntry};
use crate::config::Config;
use crate::output::{format_currency, print_table, print_warning, OutputFormat};

#[derive(Tabled, Serialize)]
struct ShapeRow {
    #[tabled(rename = "Instance Type")]
    instance_type: String,
    #[tabled(rename = "vCPUs")]
    vcpu: u32,
    #[tabled(rename = "Memory (GB)")]
    memory_gb: u32,
    #[tabled(rename = "Hourly")]
    hourly: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
}

impl From<&InstanceShape> for ShapeRow {
    fn from(shape: &InstanceShape) -> Self {
        Self {
            instance_type: shape.type_id.clone(),
            vcpu: shape.vcpu,
            memory_gb: shape.memory_gb,
            hourly: format!("${:.3}", shape.hourly_price_usd),
            monthly: format_currency(shape.hourly_price_usd * HOURS_PER_DAY * DAYS_PER_MONTH),
        }
    }
}

#[derive(Tabled, Serialize)]
struct RegionRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Price Multiplier")]
    multiplier: String,
}

impl From<RegionEntry> for RegionRow {
    fn from(entry: RegionEntry) -> Self {
        Self {
            region: entry.region,
            multiplier: format!("{:.2}x", entry.multiplier),
        }
    }
}

fn local_shapes(catalog: &PricingCatalog, region: String, engine: Engine) -> CatalogShapes {
    CatalogShapes {
        exact: catalog.has_exact(&region, engine),
        shapes: catalog.shapes_for(&region, engine).to_vec(),
        region,
        engine,
    }
}

fn local_regions(catalog: &PricingCatalog) -> CatalogRegions {
    CatalogRegions {
        base_region: catalog.base_region().to_string(),
        regions: catalog
            .regions()
            .map(|(region, multiplier)| RegionEntry {
                region: region.to_string(),
                multiplier,
            })
            .collect(),
    }
}

/// List candidate shapes for a region and engine
pub async fn show_shapes(
    client: Option<&ApiClient>,
    config: &Config,
    region: Option<String>,
    engine: Option<Engine>,
    format: OutputFormat,
) -> Result<()> {
    let engine = engine
        .or(config.default_engine)
        .context("--engine is required (or set default_engine in the config file)")?;

    let catalog = PricingCatalog::builtin();
    let region = region
        .or_else(|| config.default_region.map(|r| r.to_string()))
        .unwrap_or_else(|| catalog.base_region().to_string());

    let listing = match client {
        Some(client) => {
            client
                .get(&format!("api/v1/catalog/{}/{}", region, engine))
                .await?
        }
        None => local_shapes(&catalog, region, engine),
    };

    if !listing.exact && format == OutputFormat::Table {
        print_warning(&format!(
            "No exact catalog entry for {} in {}; showing fallback shapes",
            listing.engine, listing.region
        ));
    }

    let rows: Vec<ShapeRow> = listing.shapes.iter().map(ShapeRow::from).collect();
    print_table(&rows, format);
    Ok(())
}

/// List catalog regions with their price multipliers
pub async fn show_regions(client: Option<&ApiClient>, format: OutputFormat) -> Result<()> {
    let listing = match client {
        Some(client) => client.get("api/v1/catalog/regions").await?,
        None => local_regions(&PricingCatalog::builtin()),
    };

    let rows: Vec<RegionRow> = listing.regions.into_iter().map(RegionRow::from).collect();
    print_table(&rows, format);
    Ok(())
}
