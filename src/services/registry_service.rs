use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{
    Bill, CreateGramPanchayatRequest, CreateHouseholdRequest, CreateVillageRequest,
    GenerateBillRequest, GramPanchayat, GramPanchayatQuery, Household, HouseholdSearchQuery,
    Village,
};
use crate::services::BillingService;
use crate::utils::validators;

pub struct RegistryService;

impl RegistryService {
    pub async fn create_gram_panchayat(
        pool: &PgPool,
        req: &CreateGramPanchayatRequest,
    ) -> AppResult<GramPanchayat> {
        if !validators::validate_mobile(&req.contact_mobile) {
            return Err(AppError::Validation(
                "Invalid contact mobile number".to_string(),
            ));
        }
        if !validators::validate_pincode(&req.pincode) {
            return Err(AppError::Validation("Invalid pincode".to_string()));
        }

        let result = sqlx::query_as::<_, GramPanchayat>(
            r#"
            INSERT INTO gram_panchayats (
                name, code, district, taluk, address, pincode, state,
                contact_name, contact_mobile, upi_id, merchant_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(validators::sanitize_string(&req.name))
        .bind(validators::sanitize_string(&req.code))
        .bind(&req.district)
        .bind(&req.taluk)
        .bind(&req.address)
        .bind(&req.pincode)
        .bind(&req.state)
        .bind(&req.contact_name)
        .bind(&req.contact_mobile)
        .bind(&req.upi_id)
        .bind(&req.merchant_name)
        .fetch_one(pool)
        .await
        .map_err(AppError::from);

        match result {
            Err(ref err) if is_unique_violation(err) => Err(AppError::Conflict(
                "Gram panchayat code already exists".to_string(),
            )),
            other => other,
        }
    }

    pub async fn get_gram_panchayat(pool: &PgPool, gp_id: Uuid) -> AppResult<GramPanchayat> {
        sqlx::query_as::<_, GramPanchayat>("SELECT * FROM gram_panchayats WHERE id = $1")
            .bind(gp_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::GramPanchayatNotFound)
    }

    pub async fn list_gram_panchayats(
        pool: &PgPool,
        query: &GramPanchayatQuery,
    ) -> AppResult<Vec<GramPanchayat>> {
        let limit = query.limit.unwrap_or(20).min(100);
        let offset = query.page.unwrap_or(0) * limit;

        let panchayats = sqlx::query_as::<_, GramPanchayat>(
            r#"
            SELECT * FROM gram_panchayats
            WHERE is_active = TRUE
              AND ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&query.search)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(panchayats)
    }

    pub async fn deactivate_gram_panchayat(pool: &PgPool, gp_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE gram_panchayats SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(gp_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::GramPanchayatNotFound);
        }

        Ok(())
    }

    pub async fn create_village(
        pool: &PgPool,
        gp_id: Uuid,
        req: &CreateVillageRequest,
    ) -> AppResult<Village> {
        let gp: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM gram_panchayats WHERE id = $1 AND is_active = TRUE")
                .bind(gp_id)
                .fetch_optional(pool)
                .await?;
        if gp.is_none() {
            return Err(AppError::GramPanchayatNotFound);
        }

        let village = sqlx::query_as::<_, Village>(
            "INSERT INTO villages (gram_panchayat_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(gp_id)
        .bind(validators::sanitize_string(&req.name))
        .fetch_one(pool)
        .await?;

        Ok(village)
    }

    pub async fn list_villages(pool: &PgPool, gp_id: Uuid) -> AppResult<Vec<Village>> {
        let villages = sqlx::query_as::<_, Village>(
            "SELECT * FROM villages WHERE gram_panchayat_id = $1 AND is_active = TRUE ORDER BY name",
        )
        .bind(gp_id)
        .fetch_all(pool)
        .await?;

        Ok(villages)
    }

    pub async fn create_household(
        pool: &PgPool,
        gp_id: Uuid,
        req: &CreateHouseholdRequest,
    ) -> AppResult<Household> {
        let mut tx = pool.begin().await?;
        let household = Self::create_household_tx(&mut tx, gp_id, req).await?;
        tx.commit().await?;

        Ok(household)
    }

    /// Registers a household and generates its first bill in one
    /// transaction, the flow a field agent uses at a new connection.
    pub async fn create_household_with_first_bill(
        pool: &PgPool,
        gp_id: Uuid,
        req: &CreateHouseholdRequest,
        bill_req: &GenerateBillRequest,
    ) -> AppResult<(Household, Bill)> {
        let mut tx = pool.begin().await?;
        let household = Self::create_household_tx(&mut tx, gp_id, req).await?;
        let bill = BillingService::generate_bill_tx(&mut tx, gp_id, household.id, bill_req).await?;
        tx.commit().await?;

        tracing::info!(
            "Registered household {} with first bill {}",
            household.water_meter_number,
            bill.bill_number
        );

        let household = Household {
            previous_meter_reading: bill.current_reading,
            ..household
        };

        Ok((household, bill))
    }

    async fn create_household_tx(
        tx: &mut Transaction<'_, Postgres>,
        gp_id: Uuid,
        req: &CreateHouseholdRequest,
    ) -> AppResult<Household> {
        if let Some(aadhaar) = &req.aadhaar_number {
            if !validators::validate_aadhaar(aadhaar) {
                return Err(AppError::Validation("Invalid aadhaar number".to_string()));
            }
        }
        if let Some(mobile) = &req.mobile_number {
            if !validators::validate_mobile(mobile) {
                return Err(AppError::Validation("Invalid mobile number".to_string()));
            }
        }
        if !validators::validate_meter_number(&req.water_meter_number) {
            return Err(AppError::Validation("Invalid meter number".to_string()));
        }

        let previous_meter_reading = req.previous_meter_reading.unwrap_or(Decimal::ZERO);
        if previous_meter_reading < Decimal::ZERO {
            return Err(AppError::Validation(
                "Meter reading cannot be negative".to_string(),
            ));
        }

        let village: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM villages WHERE id = $1 AND gram_panchayat_id = $2 AND is_active = TRUE",
        )
        .bind(req.village_id)
        .bind(gp_id)
        .fetch_optional(&mut **tx)
        .await?;
        if village.is_none() {
            return Err(AppError::VillageNotFound);
        }

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM households WHERE gram_panchayat_id = $1 AND water_meter_number = $2 AND is_active = TRUE",
        )
        .bind(gp_id)
        .bind(&req.water_meter_number)
        .fetch_optional(&mut **tx)
        .await?;
        if existing.is_some() {
            return Err(AppError::MeterNumberTaken);
        }

        let result = sqlx::query_as::<_, Household>(
            r#"
            INSERT INTO households (
                gram_panchayat_id, village_id, owner_name, aadhaar_number,
                mobile_number, address, water_meter_number, sequence_number,
                property_number, usage_category, previous_meter_reading
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(gp_id)
        .bind(req.village_id)
        .bind(validators::sanitize_string(&req.owner_name))
        .bind(&req.aadhaar_number)
        .bind(&req.mobile_number)
        .bind(&req.address)
        .bind(&req.water_meter_number)
        .bind(&req.sequence_number)
        .bind(&req.property_number)
        .bind(req.usage_category)
        .bind(previous_meter_reading)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from);

        // The partial unique index catches the race the pre-check misses
        match result {
            Err(ref err) if is_unique_violation(err) => Err(AppError::MeterNumberTaken),
            other => other,
        }
    }

    pub async fn get_household(
        pool: &PgPool,
        gp_id: Uuid,
        household_id: Uuid,
    ) -> AppResult<Household> {
        sqlx::query_as::<_, Household>(
            "SELECT * FROM households WHERE id = $1 AND gram_panchayat_id = $2 AND is_active = TRUE",
        )
        .bind(household_id)
        .bind(gp_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::HouseholdNotFound)
    }

    pub async fn find_household_by_meter(
        pool: &PgPool,
        gp_id: Uuid,
        meter_number: &str,
    ) -> AppResult<Household> {
        sqlx::query_as::<_, Household>(
            "SELECT * FROM households WHERE gram_panchayat_id = $1 AND water_meter_number = $2 AND is_active = TRUE",
        )
        .bind(gp_id)
        .bind(meter_number)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::HouseholdNotFound)
    }

    pub async fn list_households_by_village(
        pool: &PgPool,
        gp_id: Uuid,
        village_id: Uuid,
    ) -> AppResult<Vec<Household>> {
        let households = sqlx::query_as::<_, Household>(
            r#"
            SELECT * FROM households
            WHERE village_id = $1 AND gram_panchayat_id = $2 AND is_active = TRUE
            ORDER BY owner_name
            "#,
        )
        .bind(village_id)
        .bind(gp_id)
        .fetch_all(pool)
        .await?;

        Ok(households)
    }

    pub async fn search_households(
        pool: &PgPool,
        gp_id: Uuid,
        query: &HouseholdSearchQuery,
    ) -> AppResult<Vec<Household>> {
        let limit = query.limit.unwrap_or(20).min(100);
        let offset = query.page.unwrap_or(0) * limit;
        let pattern = format!("%{}%", query.query.trim());

        let households = sqlx::query_as::<_, Household>(
            r#"
            SELECT * FROM households
            WHERE gram_panchayat_id = $1
              AND is_active = TRUE
              AND (owner_name ILIKE $2 OR water_meter_number ILIKE $2 OR aadhaar_number ILIKE $2)
            ORDER BY owner_name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(gp_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(households)
    }
}
