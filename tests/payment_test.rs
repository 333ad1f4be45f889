//! Payment reconciliation integration tests.

mod common;

use common::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use gramjal_billing::models::{BillStatus, PaymentMode, RecordPaymentRequest};
use gramjal_billing::services::{BillingService, PaymentService};
use gramjal_billing::AppError;

fn payment(amount: &str, mode: PaymentMode) -> RecordPaymentRequest {
    RecordPaymentRequest {
        amount: dec(amount),
        mode,
        transaction_id: None,
        remarks: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn full_payment_settles_the_bill(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3001").await;

    let outcome = PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("126.00", PaymentMode::Cash),
    )
    .await
    .unwrap();

    assert_eq!(outcome.bill.paid_amount, dec("126.00"));
    assert_eq!(outcome.bill.remaining_amount, Decimal::ZERO);
    assert_eq!(outcome.bill.status, BillStatus::Paid);
    assert_eq!(outcome.bill.payment_mode, Some(PaymentMode::Cash));
    assert!(outcome.bill.paid_date.is_some());
    assert_eq!(outcome.payment.amount, dec("126.00"));
    assert_eq!(outcome.payment.bill_id, bill.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn partial_payment_then_overpayment_is_rejected(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3002").await;

    let outcome = PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("60.00", PaymentMode::Upi),
    )
    .await
    .unwrap();
    assert_eq!(outcome.bill.paid_amount, dec("60.00"));
    assert_eq!(outcome.bill.remaining_amount, dec("66.00"));
    assert_eq!(outcome.bill.status, BillStatus::Partial);

    let err = PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("70.00", PaymentMode::Upi),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::OverpaymentRejected));
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_overpayment_leaves_the_bill_untouched(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3003").await;

    // One paisa over the remaining amount
    let err = PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("126.01", PaymentMode::Cash),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::OverpaymentRejected));

    let bill = BillingService::get_bill(&pool, gp.id, bill.id).await.unwrap();
    assert_eq!(bill.paid_amount, Decimal::ZERO);
    assert_eq!(bill.remaining_amount, dec("126.00"));
    assert_eq!(bill.status, BillStatus::Pending);

    let payments = PaymentService::payments_for_bill(&pool, gp.id, bill.id)
        .await
        .unwrap();
    assert!(payments.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn pay_later_records_without_crediting(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3004").await;

    let outcome = PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("126.00", PaymentMode::PayLater),
    )
    .await
    .unwrap();

    assert_eq!(outcome.payment.mode, PaymentMode::PayLater);
    assert_eq!(outcome.bill.paid_amount, Decimal::ZERO);
    assert_eq!(outcome.bill.remaining_amount, dec("126.00"));
    assert_eq!(outcome.bill.status, BillStatus::Pending);
    assert_eq!(outcome.bill.payment_mode, None);
    assert!(outcome.bill.paid_date.is_none());

    // The acknowledgment still lands in the audit trail
    let payments = PaymentService::payments_for_bill(&pool, gp.id, bill.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn non_positive_amounts_are_rejected(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3005").await;

    for amount in ["0", "-5"] {
        let err = PaymentService::record_payment(
            &pool,
            gp.id,
            bill.id,
            collector(),
            &payment(amount, PaymentMode::Cash),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount));
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn balance_identity_holds_across_partials(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3006").await;

    for amount in ["20.00", "30.00", "76.00"] {
        let outcome = PaymentService::record_payment(
            &pool,
            gp.id,
            bill.id,
            collector(),
            &payment(amount, PaymentMode::Cash),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome.bill.paid_amount + outcome.bill.remaining_amount,
            outcome.bill.total_amount
        );
    }

    let bill = BillingService::get_bill(&pool, gp.id, bill.id).await.unwrap();
    assert_eq!(bill.status, BillStatus::Paid);
    assert_eq!(bill.remaining_amount, Decimal::ZERO);
}

#[sqlx::test(migrations = "./migrations")]
async fn settled_bill_accepts_no_further_payment(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3007").await;

    PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("126.00", PaymentMode::Online),
    )
    .await
    .unwrap();

    let err = PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("0.01", PaymentMode::Cash),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::OverpaymentRejected));
}

#[sqlx::test(migrations = "./migrations")]
async fn payment_history_is_newest_first(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3008").await;

    PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("20.00", PaymentMode::Cash),
    )
    .await
    .unwrap();
    PaymentService::record_payment(
        &pool,
        gp.id,
        bill.id,
        collector(),
        &payment("30.00", PaymentMode::Upi),
    )
    .await
    .unwrap();

    let payments = PaymentService::payments_for_bill(&pool, gp.id, bill.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
    assert!(payments[0].created_at >= payments[1].created_at);
    assert_eq!(payments[0].amount, dec("30.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn transaction_reference_is_kept_on_bill_and_payment(pool: PgPool) {
    let (gp, village) = setup(&pool).await;
    let (_, bill) = seed_bill_with_arrears(&pool, gp.id, village.id, "WM-3009").await;

    let req = RecordPaymentRequest {
        amount: dec("126.00"),
        mode: PaymentMode::Upi,
        transaction_id: Some("UPI-88271".to_string()),
        remarks: Some("Collected at the door".to_string()),
    };
    let outcome = PaymentService::record_payment(&pool, gp.id, bill.id, collector(), &req)
        .await
        .unwrap();

    assert_eq!(outcome.payment.transaction_id.as_deref(), Some("UPI-88271"));
    assert_eq!(outcome.payment.remarks.as_deref(), Some("Collected at the door"));
    assert_eq!(outcome.bill.transaction_id.as_deref(), Some("UPI-88271"));
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_bill_is_reported(pool: PgPool) {
    let (gp, _) = setup(&pool).await;

    let err = PaymentService::record_payment(
        &pool,
        gp.id,
        Uuid::new_v4(),
        collector(),
        &payment("10.00", PaymentMode::Cash),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BillNotFound));
}
