use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Bill, BillStatus, Payment, PaymentOutcome, RecordPaymentRequest};
use crate::services::billing_service::round_money;
use crate::services::BillingService;

pub struct PaymentService;

impl PaymentService {
    /// Applies a payment against a bill. The payment row is always
    /// written as the audit trail; the bill balance is credited for
    /// every mode except `pay_later`, which only records the promise.
    pub async fn record_payment(
        pool: &PgPool,
        gp_id: Uuid,
        bill_id: Uuid,
        collected_by: Uuid,
        req: &RecordPaymentRequest,
    ) -> AppResult<PaymentOutcome> {
        let amount = round_money(req.amount);
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount);
        }

        let mut tx = pool.begin().await?;

        // Locked so concurrent partials cannot jointly overpay
        let bill = sqlx::query_as::<_, Bill>(
            "SELECT * FROM bills WHERE id = $1 AND gram_panchayat_id = $2 FOR UPDATE",
        )
        .bind(bill_id)
        .bind(gp_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::BillNotFound)?;

        if amount > bill.remaining_amount {
            return Err(AppError::OverpaymentRejected);
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (bill_id, amount, mode, transaction_id, collected_by, remarks)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(bill.id)
        .bind(amount)
        .bind(req.mode)
        .bind(&req.transaction_id)
        .bind(collected_by)
        .bind(&req.remarks)
        .fetch_one(&mut *tx)
        .await?;

        let bill = if req.mode.credits_balance() {
            let paid_amount = bill.paid_amount + amount;
            let remaining_amount = bill.remaining_amount - amount;
            let status = BillStatus::from_amounts(bill.total_amount, paid_amount);

            sqlx::query_as::<_, Bill>(
                r#"
                UPDATE bills
                SET paid_amount = $1,
                    remaining_amount = $2,
                    status = $3,
                    payment_mode = $4,
                    transaction_id = $5,
                    paid_date = NOW(),
                    updated_at = NOW()
                WHERE id = $6
                RETURNING *
                "#,
            )
            .bind(paid_amount)
            .bind(remaining_amount)
            .bind(status)
            .bind(req.mode)
            .bind(&req.transaction_id)
            .bind(bill.id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            bill
        };

        tx.commit().await?;

        tracing::info!(
            "Recorded payment of {} against bill {}",
            amount,
            bill.bill_number
        );

        Ok(PaymentOutcome { bill, payment })
    }

    pub async fn payments_for_bill(
        pool: &PgPool,
        gp_id: Uuid,
        bill_id: Uuid,
    ) -> AppResult<Vec<Payment>> {
        let bill = BillingService::get_bill(pool, gp_id, bill_id).await?;

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE bill_id = $1 ORDER BY created_at DESC",
        )
        .bind(bill.id)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }
}
