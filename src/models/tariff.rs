use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::UsageCategory;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TariffSchedule {
    pub id: Uuid,
    pub gram_panchayat_id: Uuid,
    pub effective_from: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One pricing row of a schedule. Residential rows are usage blocks
/// `[block_start, block_end)` with an open-ended last block; other
/// categories have a single row with `block_start = 0, block_end = NULL`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TariffRate {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub category: UsageCategory,
    pub block_start: Decimal,
    pub block_end: Option<Decimal>,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterTariff {
    pub schedule: TariffSchedule,
    pub rates: Vec<TariffRate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffBlock {
    /// Upper bound of the block; `None` marks the open-ended last block.
    pub upto: Option<Decimal>,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTariffRequest {
    pub residential_blocks: Vec<TariffBlock>,
    pub institutional_rate: Decimal,
    pub commercial_rate: Decimal,
    pub industrial_rate: Decimal,
}
