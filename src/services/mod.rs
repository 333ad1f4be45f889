pub mod billing_service;
pub mod payment_service;
pub mod registry_service;
pub mod tariff_service;

pub use billing_service::BillingService;
pub use payment_service::PaymentService;
pub use registry_service::RegistryService;
pub use tariff_service::{compute_demand, TariffService};
