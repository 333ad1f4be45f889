use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Bill, BillStatus, CollectionSummary, GenerateBillRequest, Household, HouseholdSnapshot,
};
use crate::services::tariff_service::{self, TariffService};

const BILL_NUMBER_PREFIX: &str = "WB";

pub struct BillingService;

impl BillingService {
    /// Generates the bill for one billing cycle: demand from the meter
    /// reading plus arrears carried from unsettled bills. The bill row
    /// and the household's reading checkpoint commit atomically.
    pub async fn generate_bill(
        pool: &PgPool,
        gp_id: Uuid,
        household_id: Uuid,
        req: &GenerateBillRequest,
    ) -> AppResult<Bill> {
        let mut tx = pool.begin().await?;
        let bill = Self::generate_bill_tx(&mut tx, gp_id, household_id, req).await?;
        tx.commit().await?;

        tracing::info!(
            "Generated bill {} for household {}",
            bill.bill_number,
            household_id
        );

        Ok(bill)
    }

    pub(crate) async fn generate_bill_tx(
        tx: &mut Transaction<'_, Postgres>,
        gp_id: Uuid,
        household_id: Uuid,
        req: &GenerateBillRequest,
    ) -> AppResult<Bill> {
        if !(1..=12).contains(&req.billing_month) {
            return Err(AppError::Validation(
                "Billing month must be between 1 and 12".to_string(),
            ));
        }

        // The row lock serializes billing per household
        let household = sqlx::query_as::<_, Household>(
            "SELECT * FROM households WHERE id = $1 AND gram_panchayat_id = $2 AND is_active = TRUE FOR UPDATE",
        )
        .bind(household_id)
        .bind(gp_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::HouseholdNotFound)?;

        if req.current_reading < household.previous_meter_reading {
            return Err(AppError::NegativeUsage);
        }

        let duplicate: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM bills WHERE household_id = $1 AND billing_year = $2 AND billing_month = $3",
        )
        .bind(household_id)
        .bind(req.billing_year)
        .bind(req.billing_month)
        .fetch_optional(&mut **tx)
        .await?;
        if duplicate.is_some() {
            return Err(AppError::BillAlreadyExists);
        }

        let tariff = TariffService::active_tariff_conn(&mut **tx, gp_id).await?;

        let usage = req.current_reading - household.previous_meter_reading;
        let demand = tariff_service::compute_demand(usage, &tariff, household.usage_category)?;
        let arrears = Self::outstanding_arrears_conn(&mut **tx, household.id).await?;

        let interest = round_money(req.interest.unwrap_or(Decimal::ZERO));
        let others = round_money(req.others.unwrap_or(Decimal::ZERO));
        let total = demand + arrears + interest + others;

        let bill_number = Self::next_bill_number(&mut **tx, gp_id).await?;
        let status = BillStatus::from_amounts(total, Decimal::ZERO);

        let bill = sqlx::query_as::<_, Bill>(
            r#"
            INSERT INTO bills (
                bill_number, gram_panchayat_id, household_id,
                billing_month, billing_year,
                previous_reading, current_reading, total_usage,
                current_demand, arrears, interest, others,
                total_amount, paid_amount, remaining_amount, status, due_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 0, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&bill_number)
        .bind(gp_id)
        .bind(household.id)
        .bind(req.billing_month)
        .bind(req.billing_year)
        .bind(household.previous_meter_reading)
        .bind(req.current_reading)
        .bind(usage)
        .bind(demand)
        .bind(arrears)
        .bind(interest)
        .bind(others)
        .bind(total)
        .bind(status)
        .bind(req.due_date)
        .fetch_one(&mut **tx)
        .await?;

        // Advance the checkpoint only once the bill is recorded
        sqlx::query(
            "UPDATE households SET previous_meter_reading = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(req.current_reading)
        .bind(household.id)
        .execute(&mut **tx)
        .await?;

        Ok(bill)
    }

    /// Sum of remaining amounts over the household's unsettled bills.
    pub async fn outstanding_arrears(pool: &PgPool, household_id: Uuid) -> AppResult<Decimal> {
        let mut conn = pool.acquire().await?;
        Self::outstanding_arrears_conn(&mut conn, household_id).await
    }

    async fn outstanding_arrears_conn(
        conn: &mut PgConnection,
        household_id: Uuid,
    ) -> AppResult<Decimal> {
        let (arrears,): (Option<Decimal>,) = sqlx::query_as(
            "SELECT SUM(remaining_amount) FROM bills WHERE household_id = $1 AND status IN ('pending', 'partial')",
        )
        .bind(household_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(arrears.unwrap_or(Decimal::ZERO))
    }

    async fn next_bill_number(conn: &mut PgConnection, gp_id: Uuid) -> AppResult<String> {
        let (seq,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO bill_counters (gram_panchayat_id, last_seq)
            VALUES ($1, 1)
            ON CONFLICT (gram_panchayat_id)
            DO UPDATE SET last_seq = bill_counters.last_seq + 1
            RETURNING last_seq
            "#,
        )
        .bind(gp_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(format!("{}{:06}", BILL_NUMBER_PREFIX, seq))
    }

    pub async fn get_bill(pool: &PgPool, gp_id: Uuid, bill_id: Uuid) -> AppResult<Bill> {
        sqlx::query_as::<_, Bill>("SELECT * FROM bills WHERE id = $1 AND gram_panchayat_id = $2")
            .bind(bill_id)
            .bind(gp_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::BillNotFound)
    }

    pub async fn bills_for_household(
        pool: &PgPool,
        gp_id: Uuid,
        household_id: Uuid,
    ) -> AppResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT * FROM bills
            WHERE household_id = $1 AND gram_panchayat_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(household_id)
        .bind(gp_id)
        .fetch_all(pool)
        .await?;

        Ok(bills)
    }

    pub async fn household_snapshot(
        pool: &PgPool,
        gp_id: Uuid,
        household_id: Uuid,
    ) -> AppResult<HouseholdSnapshot> {
        let household = sqlx::query_as::<_, Household>(
            "SELECT * FROM households WHERE id = $1 AND gram_panchayat_id = $2 AND is_active = TRUE",
        )
        .bind(household_id)
        .bind(gp_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::HouseholdNotFound)?;

        let latest_bill = sqlx::query_as::<_, Bill>(
            "SELECT * FROM bills WHERE household_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(household_id)
        .fetch_optional(pool)
        .await?;

        let (unpaid_bills,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bills WHERE household_id = $1 AND status IN ('pending', 'partial')",
        )
        .bind(household_id)
        .fetch_one(pool)
        .await?;

        Ok(HouseholdSnapshot {
            household,
            latest_bill,
            unpaid_bills,
        })
    }

    pub async fn collection_summary(
        pool: &PgPool,
        gp_id: Uuid,
        billing_month: i16,
        billing_year: i32,
    ) -> AppResult<CollectionSummary> {
        let summary = sqlx::query_as::<_, CollectionSummary>(
            r#"
            SELECT COALESCE(SUM(total_amount), 0) AS billed_amount,
                   COALESCE(SUM(paid_amount), 0) AS total_collected,
                   COUNT(*) FILTER (WHERE status = 'paid') AS paid_bills,
                   COUNT(*) FILTER (WHERE status = 'partial') AS partial_bills,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending_bills
            FROM bills
            WHERE gram_panchayat_id = $1 AND billing_month = $2 AND billing_year = $3
            "#,
        )
        .bind(gp_id)
        .bind(billing_month)
        .bind(billing_year)
        .fetch_one(pool)
        .await?;

        Ok(summary)
    }

    /// Administrative removal of a bill and its payment trail. Normal
    /// operation archives settled bills and never deletes them.
    pub async fn delete_bill(pool: &PgPool, gp_id: Uuid, bill_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1 AND gram_panchayat_id = $2")
            .bind(bill_id)
            .bind(gp_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::BillNotFound);
        }

        tracing::info!("Deleted bill {} from gram panchayat {}", bill_id, gp_id);

        Ok(())
    }
}

pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
