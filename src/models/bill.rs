use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::PaymentMode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "bill_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Partial,
    Paid,
}

impl BillStatus {
    /// Status derived from the paid/total balance: `Paid` when nothing
    /// remains, `Partial` once any amount has been credited.
    pub fn from_amounts(total_amount: Decimal, paid_amount: Decimal) -> Self {
        let remaining = total_amount - paid_amount;
        if remaining.is_zero() {
            Self::Paid
        } else if paid_amount > Decimal::ZERO {
            Self::Partial
        } else {
            Self::Pending
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl Default for BillStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bill {
    pub id: Uuid,
    pub bill_number: String,
    pub gram_panchayat_id: Uuid,
    pub household_id: Uuid,
    pub billing_month: i16,
    pub billing_year: i32,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    pub total_usage: Decimal,
    pub current_demand: Decimal,
    pub arrears: Decimal,
    pub interest: Decimal,
    pub others: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: BillStatus,
    pub payment_mode: Option<PaymentMode>,
    pub transaction_id: Option<String>,
    pub paid_date: Option<DateTime<Utc>>,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateBillRequest {
    pub current_reading: Decimal,
    pub billing_month: i16,
    pub billing_year: i32,
    pub due_date: NaiveDate,
    pub interest: Option<Decimal>,
    pub others: Option<Decimal>,
}

/// Collection figures for one gram panchayat and billing cycle.
#[derive(Debug, Serialize, FromRow)]
pub struct CollectionSummary {
    pub billed_amount: Decimal,
    pub total_collected: Decimal,
    pub paid_bills: i64,
    pub partial_bills: i64,
    pub pending_bills: i64,
}
