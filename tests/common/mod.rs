//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use gramjal_billing::models::{
    Bill, CreateGramPanchayatRequest, CreateHouseholdRequest, CreateVillageRequest,
    GenerateBillRequest, GramPanchayat, Household, PaymentMode, RecordPaymentRequest, TariffBlock,
    UpdateTariffRequest, UsageCategory, Village, WaterTariff,
};
use gramjal_billing::services::{BillingService, PaymentService, RegistryService, TariffService};

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn collector() -> Uuid {
    Uuid::new_v4()
}

/// Seeds a gram panchayat with the default tariff and one village.
pub async fn setup(pool: &PgPool) -> (GramPanchayat, Village) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let gp = seed_gram_panchayat(pool, "GP-HM-01").await;
    seed_default_tariff(pool, gp.id).await;
    let village = seed_village(pool, gp.id).await;
    (gp, village)
}

pub async fn seed_gram_panchayat(pool: &PgPool, code: &str) -> GramPanchayat {
    let req = CreateGramPanchayatRequest {
        name: "Hulimangala".to_string(),
        code: code.to_string(),
        district: "Bengaluru Rural".to_string(),
        taluk: "Anekal".to_string(),
        address: "Panchayat Office Road".to_string(),
        pincode: "560105".to_string(),
        state: "Karnataka".to_string(),
        contact_name: "Savitha R".to_string(),
        contact_mobile: "9876543210".to_string(),
        upi_id: Some("hulimangala@upi".to_string()),
        merchant_name: Some("Hulimangala GP".to_string()),
    };
    RegistryService::create_gram_panchayat(pool, &req)
        .await
        .unwrap()
}

/// Residential blocks 0-7 @ 5, 7-10 @ 7, 10-15 @ 10, 15-20 @ 12, 20+ @ 15;
/// flat rates for the non-residential categories.
pub async fn seed_default_tariff(pool: &PgPool, gp_id: Uuid) -> WaterTariff {
    let req = UpdateTariffRequest {
        residential_blocks: vec![
            TariffBlock {
                upto: Some(dec("7")),
                rate: dec("5"),
            },
            TariffBlock {
                upto: Some(dec("10")),
                rate: dec("7"),
            },
            TariffBlock {
                upto: Some(dec("15")),
                rate: dec("10"),
            },
            TariffBlock {
                upto: Some(dec("20")),
                rate: dec("12"),
            },
            TariffBlock {
                upto: None,
                rate: dec("15"),
            },
        ],
        institutional_rate: dec("6"),
        commercial_rate: dec("8"),
        industrial_rate: dec("11"),
    };
    TariffService::update_tariff(pool, gp_id, &req)
        .await
        .unwrap()
}

pub async fn seed_village(pool: &PgPool, gp_id: Uuid) -> Village {
    let req = CreateVillageRequest {
        name: "Doddakere".to_string(),
    };
    RegistryService::create_village(pool, gp_id, &req)
        .await
        .unwrap()
}

pub fn household_request(village_id: Uuid, meter: &str) -> CreateHouseholdRequest {
    CreateHouseholdRequest {
        village_id,
        owner_name: "Manjunath K".to_string(),
        aadhaar_number: Some("234567890123".to_string()),
        mobile_number: Some("9845012345".to_string()),
        address: Some("3rd Cross, Doddakere".to_string()),
        water_meter_number: meter.to_string(),
        sequence_number: Some("SEQ-014".to_string()),
        property_number: Some("PID-7741".to_string()),
        usage_category: UsageCategory::Residential,
        previous_meter_reading: Some(dec("100")),
    }
}

pub async fn seed_household(
    pool: &PgPool,
    gp_id: Uuid,
    village_id: Uuid,
    meter: &str,
) -> Household {
    RegistryService::create_household(pool, gp_id, &household_request(village_id, meter))
        .await
        .unwrap()
}

pub fn bill_request(current_reading: &str, month: i16, year: i32) -> GenerateBillRequest {
    GenerateBillRequest {
        current_reading: dec(current_reading),
        billing_month: month,
        billing_year: year,
        due_date: NaiveDate::from_ymd_opt(year, month as u32, 28).unwrap(),
        interest: None,
        others: None,
    }
}

/// A household whose second bill totals 126.00: demand 76 for 12 units
/// plus 50 outstanding from the first cycle.
pub async fn seed_bill_with_arrears(
    pool: &PgPool,
    gp_id: Uuid,
    village_id: Uuid,
    meter: &str,
) -> (Household, Bill) {
    let household = seed_household(pool, gp_id, village_id, meter).await;

    // First cycle: usage 10, demand 56; pay 6 so 50 stays outstanding
    let first = BillingService::generate_bill(pool, gp_id, household.id, &bill_request("110", 3, 2025))
        .await
        .unwrap();
    let payment = RecordPaymentRequest {
        amount: dec("6"),
        mode: PaymentMode::Cash,
        transaction_id: None,
        remarks: None,
    };
    PaymentService::record_payment(pool, gp_id, first.id, collector(), &payment)
        .await
        .unwrap();

    // Second cycle: usage 12, demand 76, arrears 50
    let bill = BillingService::generate_bill(pool, gp_id, household.id, &bill_request("122", 4, 2025))
        .await
        .unwrap();

    (household, bill)
}
