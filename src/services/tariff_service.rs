use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    TariffRate, TariffSchedule, UpdateTariffRequest, UsageCategory, WaterTariff,
};

/// Demand for a metered usage volume under the given tariff.
///
/// Residential usage is sliced across ascending blocks (lower bound
/// inclusive, upper bound exclusive) and each slice is charged at its
/// block rate; other categories are charged a flat per-unit rate. The
/// result is rounded to two decimals, half away from zero.
pub fn compute_demand(
    usage: Decimal,
    tariff: &WaterTariff,
    category: UsageCategory,
) -> AppResult<Decimal> {
    if usage < Decimal::ZERO {
        return Err(AppError::InvalidUsage);
    }

    let mut rates: Vec<&TariffRate> = tariff
        .rates
        .iter()
        .filter(|rate| rate.category == category)
        .collect();

    if rates.is_empty() {
        return Err(AppError::TariffNotConfigured);
    }

    let demand = if category.is_residential() {
        rates.sort_by(|a, b| a.block_start.cmp(&b.block_start));

        let mut total = Decimal::ZERO;
        for rate in rates {
            if usage <= rate.block_start {
                break;
            }
            let upper = rate.block_end.map_or(usage, |end| usage.min(end));
            total += (upper - rate.block_start) * rate.rate;
        }
        total
    } else {
        usage * rates[0].rate
    };

    Ok(demand.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub struct TariffService;

impl TariffService {
    pub async fn active_tariff(pool: &PgPool, gp_id: Uuid) -> AppResult<WaterTariff> {
        let mut conn = pool.acquire().await?;
        Self::active_tariff_conn(&mut conn, gp_id).await
    }

    pub(crate) async fn active_tariff_conn(
        conn: &mut PgConnection,
        gp_id: Uuid,
    ) -> AppResult<WaterTariff> {
        let schedule = sqlx::query_as::<_, TariffSchedule>(
            "SELECT * FROM tariff_schedules WHERE gram_panchayat_id = $1 AND is_active = TRUE",
        )
        .bind(gp_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::TariffNotConfigured)?;

        let rates = sqlx::query_as::<_, TariffRate>(
            "SELECT * FROM tariff_rates WHERE schedule_id = $1 ORDER BY category, block_start",
        )
        .bind(schedule.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(WaterTariff { schedule, rates })
    }

    /// Replaces the gram panchayat's tariff: the current schedule is
    /// deactivated and a fresh one inserted. Old schedules are kept for
    /// the audit trail of past bills.
    pub async fn update_tariff(
        pool: &PgPool,
        gp_id: Uuid,
        req: &UpdateTariffRequest,
    ) -> AppResult<WaterTariff> {
        let rows = build_rate_rows(req)?;

        let mut tx = pool.begin().await?;

        let gp: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM gram_panchayats WHERE id = $1 AND is_active = TRUE")
                .bind(gp_id)
                .fetch_optional(&mut *tx)
                .await?;
        if gp.is_none() {
            return Err(AppError::GramPanchayatNotFound);
        }

        sqlx::query(
            "UPDATE tariff_schedules SET is_active = FALSE WHERE gram_panchayat_id = $1 AND is_active = TRUE",
        )
        .bind(gp_id)
        .execute(&mut *tx)
        .await?;

        let schedule = sqlx::query_as::<_, TariffSchedule>(
            "INSERT INTO tariff_schedules (gram_panchayat_id) VALUES ($1) RETURNING *",
        )
        .bind(gp_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut rates = Vec::with_capacity(rows.len());
        for (category, block_start, block_end, rate) in rows {
            let row = sqlx::query_as::<_, TariffRate>(
                r#"
                INSERT INTO tariff_rates (schedule_id, category, block_start, block_end, rate)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(schedule.id)
            .bind(category)
            .bind(block_start)
            .bind(block_end)
            .bind(rate)
            .fetch_one(&mut *tx)
            .await?;
            rates.push(row);
        }

        tx.commit().await?;

        tracing::info!("Updated water tariff for gram panchayat {}", gp_id);

        Ok(WaterTariff { schedule, rates })
    }
}

type RateRow = (UsageCategory, Decimal, Option<Decimal>, Decimal);

fn build_rate_rows(req: &UpdateTariffRequest) -> AppResult<Vec<RateRow>> {
    if req.residential_blocks.is_empty() {
        return Err(AppError::Validation(
            "At least one residential block is required".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut start = Decimal::ZERO;
    let last = req.residential_blocks.len() - 1;

    for (i, block) in req.residential_blocks.iter().enumerate() {
        if block.rate < Decimal::ZERO {
            return Err(AppError::Validation(
                "Block rate cannot be negative".to_string(),
            ));
        }

        let end = match (i == last, block.upto) {
            (true, None) => None,
            (true, Some(_)) => {
                return Err(AppError::Validation(
                    "The last residential block must be open-ended".to_string(),
                ))
            }
            (false, Some(upto)) if upto > start => Some(upto),
            (false, Some(_)) => {
                return Err(AppError::Validation(
                    "Residential blocks must have ascending bounds".to_string(),
                ))
            }
            (false, None) => {
                return Err(AppError::Validation(
                    "Only the last residential block may be open-ended".to_string(),
                ))
            }
        };

        rows.push((UsageCategory::Residential, start, end, block.rate));
        if let Some(end) = end {
            start = end;
        }
    }

    for (category, rate) in [
        (UsageCategory::Institutional, req.institutional_rate),
        (UsageCategory::Commercial, req.commercial_rate),
        (UsageCategory::Industrial, req.industrial_rate),
    ] {
        if rate < Decimal::ZERO {
            return Err(AppError::Validation(
                "Flat rate cannot be negative".to_string(),
            ));
        }
        rows.push((category, Decimal::ZERO, None, rate));
    }

    Ok(rows)
}
