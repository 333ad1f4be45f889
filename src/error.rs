use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Usage volume cannot be negative")]
    InvalidUsage,

    #[error("Current reading cannot be less than previous reading")]
    NegativeUsage,

    #[error("Gram panchayat not found")]
    GramPanchayatNotFound,

    #[error("Village not found")]
    VillageNotFound,

    #[error("House not found")]
    HouseholdNotFound,

    #[error("Water tariff not configured for this gram panchayat")]
    TariffNotConfigured,

    #[error("Bill not found")]
    BillNotFound,

    #[error("A bill already exists for this billing cycle")]
    BillAlreadyExists,

    #[error("House with this meter number already exists")]
    MeterNumberTaken,

    #[error("Payment amount must be greater than zero")]
    InvalidAmount,

    #[error("Payment amount cannot exceed remaining amount")]
    OverpaymentRejected,

    #[error("Concurrent update conflict")]
    ConcurrencyConflict,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // serialization failure, deadlock, lock not available
            if matches!(
                db_err.code().as_deref(),
                Some("40001") | Some("40P01") | Some("55P03")
            ) {
                return AppError::ConcurrencyConflict;
            }
        }
        AppError::Database(err)
    }
}

pub(crate) fn is_unique_violation(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Database(sqlx::Error::Database(db_err))
            if db_err.code().as_deref() == Some("23505")
    )
}

pub type AppResult<T> = Result<T, AppError>;
