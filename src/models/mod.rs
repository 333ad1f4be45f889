pub mod bill;
pub mod gram_panchayat;
pub mod household;
pub mod payment;
pub mod tariff;
pub mod village;

pub use bill::*;
pub use gram_panchayat::*;
pub use household::*;
pub use payment::*;
pub use tariff::*;
pub use village::*;
