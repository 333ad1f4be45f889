use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Bill;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "usage_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UsageCategory {
    Residential,
    Institutional,
    Commercial,
    Industrial,
}

impl UsageCategory {
    /// Residential connections are billed on progressive usage blocks,
    /// every other category on a flat per-unit rate.
    pub fn is_residential(self) -> bool {
        matches!(self, Self::Residential)
    }
}

impl Default for UsageCategory {
    fn default() -> Self {
        Self::Residential
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Household {
    pub id: Uuid,
    pub gram_panchayat_id: Uuid,
    pub village_id: Uuid,
    pub owner_name: String,
    pub aadhaar_number: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub water_meter_number: String,
    pub sequence_number: Option<String>,
    pub property_number: Option<String>,
    pub usage_category: UsageCategory,
    pub previous_meter_reading: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHouseholdRequest {
    pub village_id: Uuid,
    pub owner_name: String,
    pub aadhaar_number: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub water_meter_number: String,
    pub sequence_number: Option<String>,
    pub property_number: Option<String>,
    pub usage_category: UsageCategory,
    pub previous_meter_reading: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct HouseholdSearchQuery {
    pub query: String,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Pre-billing lookup: the household with its latest bill and how many
/// bills are still outstanding.
#[derive(Debug, Serialize)]
pub struct HouseholdSnapshot {
    pub household: Household,
    pub latest_bill: Option<Bill>,
    pub unpaid_bills: i64,
}
