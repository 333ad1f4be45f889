use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Bill;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_mode", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    Online,
    PayLater,
}

impl PaymentMode {
    /// `pay_later` records an acknowledgment only; the bill balance is
    /// credited by every other mode.
    pub fn credits_balance(self) -> bool {
        !matches!(self, Self::PayLater)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub transaction_id: Option<String>,
    pub collected_by: Uuid,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub transaction_id: Option<String>,
    pub remarks: Option<String>,
}

/// Result of applying a payment: the updated bill together with the
/// payment record that was written.
#[derive(Debug, Serialize)]
pub struct PaymentOutcome {
    pub bill: Bill,
    pub payment: Payment,
}
