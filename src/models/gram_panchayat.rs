use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GramPanchayat {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub district: String,
    pub taluk: String,
    pub address: String,
    pub pincode: String,
    pub state: String,
    pub contact_name: String,
    pub contact_mobile: String,
    pub upi_id: Option<String>,
    pub merchant_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGramPanchayatRequest {
    pub name: String,
    pub code: String,
    pub district: String,
    pub taluk: String,
    pub address: String,
    pub pincode: String,
    pub state: String,
    pub contact_name: String,
    pub contact_mobile: String,
    pub upi_id: Option<String>,
    pub merchant_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GramPanchayatQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
