//! Itemized monthly cost of a recommendation

use crate::models::{CostBreakdown, Environment, InstanceShape, WorkloadSpec};

pub const HOURS_PER_DAY: f64 = 24.0;

/// Months are billed as 30 days
pub const DAYS_PER_MONTH: f64 = 30.0;

/// USD per GB-month of provisioned storage
pub const STORAGE_PRICE_PER_GB: f64 = 0.115;

/// IOPS included with storage at no extra charge
pub const INCLUDED_IOPS: u32 = 3000;

/// USD per provisioned IOPS above the included amount
pub const IOPS_PRICE: f64 = 0.005;

/// USD per GB-month of backup storage
pub const BACKUP_PRICE_PER_GB: f64 = 0.095;

/// USD per GB of outbound data transfer
pub const TRANSFER_PRICE_PER_GB: f64 = 0.09;

/// Monitoring overhead as a share of PROD instance cost
pub const MONITORING_SHARE: f64 = 0.1;

/// Multiplier for the standby node of a PROD multi-AZ deployment
pub const PROD_HA_NODES: f64 = 2.0;

/// Compute the monthly cost of running `shape` with `storage_gb` of storage
///
/// PROD instance cost is always doubled for the standby node, regardless of
/// the profile's `ha_required` flag.
pub fn monthly_costs(
    shape: &InstanceShape,
    storage_gb: u32,
    spec: &WorkloadSpec,
    environment: Environment,
) -> CostBreakdown {
    let is_prod = environment == Environment::Prod;
    let storage_gb = f64::from(storage_gb);

    let mut instance = shape.hourly_price_usd * HOURS_PER_DAY * DAYS_PER_MONTH;
    if is_prod {
        instance *= PROD_HA_NODES;
    }

    let storage = storage_gb * STORAGE_PRICE_PER_GB;
    let iops = f64::from(spec.iops.saturating_sub(INCLUDED_IOPS)) * IOPS_PRICE;
    let backup =
        storage_gb * BACKUP_PRICE_PER_GB * (f64::from(spec.backup_retention_days) / DAYS_PER_MONTH);
    let data_transfer = f64::from(spec.data_transfer_gb_month) * TRANSFER_PRICE_PER_GB;
    let monitoring = if is_prod {
        instance * MONITORING_SHARE
    } else {
        0.0
    };

    CostBreakdown {
        instance,
        storage,
        iops,
        backup,
        data_transfer,
        monitoring,
        total: instance + storage + iops + backup + data_transfer + monitoring,
    }
}
